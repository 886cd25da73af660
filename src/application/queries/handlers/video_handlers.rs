//! Video Query Handlers

use std::path::{Path, PathBuf};

use crate::application::error::ApplicationError;
use crate::application::queries::ListSlots;
use crate::domain::video::{is_listed_material, parse_clip_file_name, BGM_FILE};

// ============================================================================
// Response DTOs
// ============================================================================

/// 槽位素材
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    /// 0 为背景音乐；非数字命名的片段为 None
    pub index: Option<u32>,
    pub file_name: String,
    pub size: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListSlots Handler
///
/// 背景音乐在前，片段按序号升序，合成结果和临时文件不列出。
pub struct ListSlotsHandler {
    video_dir: PathBuf,
}

impl ListSlotsHandler {
    pub fn new(video_dir: impl AsRef<Path>) -> Self {
        Self {
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, _query: ListSlots) -> Result<Vec<SlotEntry>, ApplicationError> {
        let mut entries = match tokio::fs::read_dir(&self.video_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !is_listed_material(&file_name) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let index = if file_name == BGM_FILE {
                Some(0)
            } else {
                parse_clip_file_name(&file_name)
            };
            slots.push(SlotEntry {
                index,
                file_name,
                size: metadata.len(),
            });
        }

        slots.sort_by(|a, b| {
            (a.index.is_none(), a.index, &a.file_name).cmp(&(b.index.is_none(), b.index, &b.file_name))
        });
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_slots_filters_and_orders() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path();
        for name in ["10.mp4", "2.mp4", "bgm.mp3", "output.mp4", "temp_combined.mp4", "mylist.txt", "intro.mp4"] {
            std::fs::write(dir.join(name), b"xx").unwrap();
        }

        let slots = ListSlotsHandler::new(dir).handle(ListSlots).await.unwrap();
        let names: Vec<&str> = slots.iter().map(|s| s.file_name.as_str()).collect();

        assert_eq!(names, vec!["bgm.mp3", "2.mp4", "10.mp4", "intro.mp4"]);
        assert_eq!(slots[0].index, Some(0));
        assert_eq!(slots[3].index, None);
        assert_eq!(slots[1].size, 2);
    }

    #[tokio::test]
    async fn test_list_slots_missing_dir_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let slots = ListSlotsHandler::new(root.path().join("absent"))
            .handle(ListSlots)
            .await
            .unwrap();
        assert!(slots.is_empty());
    }
}
