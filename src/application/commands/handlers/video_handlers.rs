//! Video Command Handlers
//!
//! 视频工作目录中的槽位管理与最终合成。
//! 所有编码工作都经由 `MediaTranscoderPort` 完成。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ClearAllSlots, CleanSlot, DeleteSlot, MergeVideo, UploadSlot};
use crate::application::error::ApplicationError;
use crate::application::ports::MediaTranscoderPort;
use crate::domain::video::{
    concat_manifest, is_managed_file, parse_clip_file_name, VideoSlot, BGM_FILE, BGM_VOLUME,
    COMBINED_FILE, CONCAT_LIST_FILE, OUTPUT_FILE, TEMP_PREFIX, TRIM_OFFSET_SECS,
};

/// 上传响应
#[derive(Debug, Clone)]
pub struct UploadSlotResponse {
    pub slot: VideoSlot,
    pub file_name: String,
    pub size: u64,
}

/// 删除响应
#[derive(Debug, Clone)]
pub struct DeleteSlotResponse {
    pub slot: VideoSlot,
    /// 文件原本存在并被删除
    pub removed: bool,
}

/// 清空响应
#[derive(Debug, Clone)]
pub struct ClearAllResponse {
    pub removed: usize,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct MergeVideoResponse {
    /// 参与拼接的片段序号（升序）
    pub clips: Vec<u32>,
    pub with_music: bool,
    pub output: PathBuf,
}

// ============================================================================
// UploadSlot
// ============================================================================

/// UploadSlot Handler
///
/// 0 号槽位原样保存为背景音乐；片段先落临时文件，裁剪重编码后换入。
pub struct UploadSlotHandler {
    transcoder: Arc<dyn MediaTranscoderPort>,
    video_dir: PathBuf,
}

impl UploadSlotHandler {
    pub fn new(transcoder: Arc<dyn MediaTranscoderPort>, video_dir: impl AsRef<Path>) -> Self {
        Self {
            transcoder,
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, command: UploadSlot) -> Result<UploadSlotResponse, ApplicationError> {
        let slot = VideoSlot::from_index(command.index)?;
        if command.data.is_empty() {
            return Err(ApplicationError::validation("Uploaded file is empty"));
        }
        tokio::fs::create_dir_all(&self.video_dir).await?;

        let file_name = slot.file_name();
        let target = self.video_dir.join(&file_name);

        match slot {
            VideoSlot::BackgroundMusic => {
                tokio::fs::write(&target, &command.data).await?;
            }
            VideoSlot::Clip(n) => {
                let upload = self
                    .video_dir
                    .join(format!("{}{}_{}.mp4", TEMP_PREFIX, n, Uuid::new_v4()));
                tokio::fs::write(&upload, &command.data).await?;

                let result = trim_into(self.transcoder.as_ref(), &upload, &target).await;
                remove_quietly(&upload).await;
                result?;
            }
        }

        let size = tokio::fs::metadata(&target).await?.len();
        tracing::info!(slot = slot.index(), file = %file_name, size, "Slot uploaded");

        Ok(UploadSlotResponse {
            slot,
            file_name,
            size,
        })
    }
}

// ============================================================================
// CleanSlot
// ============================================================================

/// CleanSlot Handler - 对已有片段再做一次裁剪重编码
pub struct CleanSlotHandler {
    transcoder: Arc<dyn MediaTranscoderPort>,
    video_dir: PathBuf,
}

impl CleanSlotHandler {
    pub fn new(transcoder: Arc<dyn MediaTranscoderPort>, video_dir: impl AsRef<Path>) -> Self {
        Self {
            transcoder,
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, command: CleanSlot) -> Result<UploadSlotResponse, ApplicationError> {
        let n = VideoSlot::clip(command.index)?;
        let slot = VideoSlot::Clip(n);
        let file_name = slot.file_name();
        let target = self.video_dir.join(&file_name);

        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(ApplicationError::not_found("Video slot", n));
        }

        trim_into(self.transcoder.as_ref(), &target, &target).await?;

        let size = tokio::fs::metadata(&target).await?.len();
        tracing::info!(slot = n, size, "Slot cleaned");

        Ok(UploadSlotResponse {
            slot,
            file_name,
            size,
        })
    }
}

// ============================================================================
// DeleteSlot
// ============================================================================

/// DeleteSlot Handler - 幂等删除
pub struct DeleteSlotHandler {
    video_dir: PathBuf,
}

impl DeleteSlotHandler {
    pub fn new(video_dir: impl AsRef<Path>) -> Self {
        Self {
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, command: DeleteSlot) -> Result<DeleteSlotResponse, ApplicationError> {
        let slot = VideoSlot::from_index(command.index)?;
        let path = self.video_dir.join(slot.file_name());

        let removed = match tokio::fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };

        tracing::info!(slot = slot.index(), removed, "Slot deleted");
        Ok(DeleteSlotResponse { slot, removed })
    }
}

// ============================================================================
// ClearAllSlots
// ============================================================================

/// ClearAllSlots Handler - 删除工作目录中所有 mp4/mp3/txt
pub struct ClearAllSlotsHandler {
    video_dir: PathBuf,
}

impl ClearAllSlotsHandler {
    pub fn new(video_dir: impl AsRef<Path>) -> Self {
        Self {
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, _command: ClearAllSlots) -> Result<ClearAllResponse, ApplicationError> {
        let mut entries = match tokio::fs::read_dir(&self.video_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ClearAllResponse { removed: 0 });
            }
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type().await?.is_file() || !is_managed_file(&name) {
                continue;
            }
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }

        tracing::info!(removed, "Video workspace cleared");
        Ok(ClearAllResponse { removed })
    }
}

// ============================================================================
// MergeVideo
// ============================================================================

/// MergeVideo Handler
///
/// 1. 按序号拼接所有片段（stream copy）
/// 2. 有背景音乐时混音，否则直接改名为最终输出
pub struct MergeVideoHandler {
    transcoder: Arc<dyn MediaTranscoderPort>,
    video_dir: PathBuf,
}

impl MergeVideoHandler {
    pub fn new(transcoder: Arc<dyn MediaTranscoderPort>, video_dir: impl AsRef<Path>) -> Self {
        Self {
            transcoder,
            video_dir: video_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(&self, _command: MergeVideo) -> Result<MergeVideoResponse, ApplicationError> {
        let clips = self.collect_clips().await?;
        if clips.is_empty() {
            return Err(ApplicationError::precondition("No video clips to merge"));
        }

        // concat 清单需要绝对路径
        let video_dir = tokio::fs::canonicalize(&self.video_dir).await?;
        let paths: Vec<PathBuf> = clips
            .iter()
            .map(|(_, name)| video_dir.join(name))
            .collect();

        let list_file = video_dir.join(CONCAT_LIST_FILE);
        let combined = video_dir.join(COMBINED_FILE);
        let output = video_dir.join(OUTPUT_FILE);
        let music = video_dir.join(BGM_FILE);

        tokio::fs::write(&list_file, concat_manifest(&paths)).await?;
        self.transcoder.concat(&list_file, &combined).await?;

        let with_music = tokio::fs::try_exists(&music).await.unwrap_or(false);
        if with_music {
            self.transcoder
                .mix_background(&combined, &music, &output, BGM_VOLUME)
                .await?;
            remove_quietly(&combined).await;
        } else {
            tokio::fs::rename(&combined, &output).await?;
        }
        remove_quietly(&list_file).await;

        let clips: Vec<u32> = clips.into_iter().map(|(n, _)| n).collect();
        tracing::info!(clips = ?clips, with_music, output = %output.display(), "Video merged");

        Ok(MergeVideoResponse {
            clips,
            with_music,
            output,
        })
    }

    async fn collect_clips(&self) -> Result<Vec<(u32, String)>, ApplicationError> {
        let mut entries = match tokio::fs::read_dir(&self.video_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut clips = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(n) = parse_clip_file_name(&name) {
                clips.push((n, name));
            }
        }
        clips.sort();
        Ok(clips)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// 裁剪重编码到临时文件，成功后换入目标（输入与目标可以相同）
async fn trim_into(
    transcoder: &dyn MediaTranscoderPort,
    input: &Path,
    target: &Path,
) -> Result<(), ApplicationError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staged = dir.join(format!("{}clean_{}_{}.mp4", TEMP_PREFIX, stem, Uuid::new_v4()));

    if let Err(e) = transcoder.trim_reencode(input, &staged, TRIM_OFFSET_SECS).await {
        remove_quietly(&staged).await;
        return Err(e.into());
    }
    tokio::fs::rename(&staged, target).await?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTranscoder;

    fn workspace() -> (tempfile::TempDir, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let video_dir = root.path().join("video");
        std::fs::create_dir_all(&video_dir).unwrap();
        (root, video_dir)
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_upload_background_music_verbatim() {
        let (_root, dir) = workspace();
        let transcoder = Arc::new(RecordingTranscoder::default());
        let handler = UploadSlotHandler::new(transcoder.clone(), &dir);

        let resp = handler
            .handle(UploadSlot { index: 0, data: b"ID3 music".to_vec() })
            .await
            .unwrap();

        assert_eq!(resp.file_name, "bgm.mp3");
        assert_eq!(std::fs::read(dir.join("bgm.mp3")).unwrap(), b"ID3 music");
        assert!(transcoder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_clip_is_trimmed_and_temp_removed() {
        let (_root, dir) = workspace();
        let transcoder = Arc::new(RecordingTranscoder::default());
        let handler = UploadSlotHandler::new(transcoder.clone(), &dir);

        let resp = handler
            .handle(UploadSlot { index: 7, data: b"clip".to_vec() })
            .await
            .unwrap();

        assert_eq!(resp.slot, VideoSlot::Clip(7));
        assert_eq!(names(&dir), vec!["7.mp4"]);
        assert_eq!(transcoder.calls(), vec!["trim"]);
    }

    #[tokio::test]
    async fn test_upload_rejects_out_of_range_slot() {
        let (_root, dir) = workspace();
        let handler = UploadSlotHandler::new(Arc::new(RecordingTranscoder::default()), &dir);

        for index in [-1, 31] {
            let err = handler
                .handle(UploadSlot { index, data: b"x".to_vec() })
                .await
                .unwrap_err();
            assert!(matches!(err, ApplicationError::ValidationError(_)));
        }
        assert!(names(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_failed_transcode_keeps_existing_slot() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("3.mp4"), b"old clip").unwrap();
        let handler = UploadSlotHandler::new(Arc::new(RecordingTranscoder::failing()), &dir);

        let err = handler
            .handle(UploadSlot { index: 3, data: b"new".to_vec() })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));
        assert_eq!(std::fs::read(dir.join("3.mp4")).unwrap(), b"old clip");
        assert_eq!(names(&dir), vec!["3.mp4"]);
    }

    #[tokio::test]
    async fn test_clean_slot() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("2.mp4"), b"clip").unwrap();
        let transcoder = Arc::new(RecordingTranscoder::default());
        let handler = CleanSlotHandler::new(transcoder.clone(), &dir);

        handler.handle(CleanSlot { index: 2 }).await.unwrap();
        assert_eq!(names(&dir), vec!["2.mp4"]);
        assert_eq!(transcoder.calls(), vec!["trim"]);

        let err = handler.handle(CleanSlot { index: 5 }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));

        let err = handler.handle(CleanSlot { index: 0 }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("4.mp4"), b"clip").unwrap();
        let handler = DeleteSlotHandler::new(&dir);

        let first = handler.handle(DeleteSlot { index: 4 }).await.unwrap();
        let second = handler.handle(DeleteSlot { index: 4 }).await.unwrap();

        assert!(first.removed);
        assert!(!second.removed);
        assert!(names(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_removes_managed_files() {
        let (_root, dir) = workspace();
        for name in ["1.mp4", "bgm.mp3", "mylist.txt", "OUTPUT.MP4", "notes.md"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let resp = ClearAllSlotsHandler::new(&dir)
            .handle(ClearAllSlots)
            .await
            .unwrap();

        assert_eq!(resp.removed, 4);
        assert_eq!(names(&dir), vec!["notes.md"]);
    }

    #[tokio::test]
    async fn test_merge_orders_clips_numerically() {
        let (_root, dir) = workspace();
        for name in ["10.mp4", "2.mp4", "1.mp4", "temp_9_x.mp4", "output.mp4"] {
            std::fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
        let transcoder = Arc::new(RecordingTranscoder::default());
        let handler = MergeVideoHandler::new(transcoder.clone(), &dir);

        let resp = handler.handle(MergeVideo).await.unwrap();

        assert_eq!(resp.clips, vec![1, 2, 10]);
        assert!(!resp.with_music);
        assert_eq!(transcoder.calls(), vec!["concat"]);

        let manifest = transcoder.last_manifest().unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("/1.mp4'"));
        assert!(lines[2].ends_with("/10.mp4'"));

        let listing = names(&dir);
        assert!(listing.contains(&"output.mp4".to_string()));
        assert!(!listing.contains(&"mylist.txt".to_string()));
        assert!(!listing.contains(&"temp_combined.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_merge_mixes_background_music() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("1.mp4"), b"a").unwrap();
        std::fs::write(dir.join("bgm.mp3"), b"m").unwrap();
        let transcoder = Arc::new(RecordingTranscoder::default());
        let handler = MergeVideoHandler::new(transcoder.clone(), &dir);

        let resp = handler.handle(MergeVideo).await.unwrap();

        assert!(resp.with_music);
        assert_eq!(transcoder.calls(), vec!["concat", "mix"]);
        assert!(resp.output.exists());
        assert!(!dir.join("temp_combined.mp4").exists());
    }

    #[tokio::test]
    async fn test_merge_concat_failure_is_external_service_error() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("1.mp4"), b"a").unwrap();
        let transcoder = Arc::new(RecordingTranscoder::failing_on(&["concat"]));
        let handler = MergeVideoHandler::new(transcoder.clone(), &dir);

        let err = handler.handle(MergeVideo).await.unwrap_err();

        match err {
            ApplicationError::ExternalServiceError(msg) => {
                assert!(msg.contains("Invalid data found when processing input"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transcoder.calls(), vec!["concat"]);
        assert!(!dir.join("output.mp4").exists());
    }

    #[tokio::test]
    async fn test_merge_mix_failure_keeps_previous_output() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("1.mp4"), b"a").unwrap();
        std::fs::write(dir.join("bgm.mp3"), b"m").unwrap();
        std::fs::write(dir.join("output.mp4"), b"previous").unwrap();
        let transcoder = Arc::new(RecordingTranscoder::failing_on(&["mix"]));
        let handler = MergeVideoHandler::new(transcoder.clone(), &dir);

        let err = handler.handle(MergeVideo).await.unwrap_err();

        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));
        assert_eq!(transcoder.calls(), vec!["concat", "mix"]);
        assert_eq!(std::fs::read(dir.join("output.mp4")).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_merge_without_clips_is_precondition_failure() {
        let (_root, dir) = workspace();
        std::fs::write(dir.join("bgm.mp3"), b"m").unwrap();
        let handler = MergeVideoHandler::new(Arc::new(RecordingTranscoder::default()), &dir);

        let err = handler.handle(MergeVideo).await.unwrap_err();
        assert!(matches!(err, ApplicationError::PreconditionFailed(_)));
    }
}
