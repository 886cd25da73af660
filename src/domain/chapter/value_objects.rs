//! Chapter Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::page::LOGO_FILE;

/// 章节定位键：(小说 ID, 章节序号)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterKey {
    pub novel_id: Uuid,
    pub episode_order: u32,
}

impl ChapterKey {
    pub fn new(novel_id: Uuid, episode_order: u32) -> Self {
        Self {
            novel_id,
            episode_order,
        }
    }
}

impl std::fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/ep{}", self.novel_id, self.episode_order)
    }
}

/// 章节媒体目录
///
/// 目录结构：
/// - `{root}/{novel_id}/`            小说级共享素材（logo.png、99.png）
/// - `{root}/{novel_id}/ep{order}/`  章节原图
/// - `.../ep{order}/export/`         标准化导出图
/// - `.../ep{order}/split/`          四宫格切图（旧模式）
/// - `.../ep{order}/audio/`          分镜配音
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMediaFolder {
    root: PathBuf,
    key: ChapterKey,
}

impl ChapterMediaFolder {
    pub const EXPORT_DIR: &'static str = "export";
    pub const SPLIT_DIR: &'static str = "split";
    pub const AUDIO_DIR: &'static str = "audio";

    pub fn new(root: impl AsRef<Path>, key: ChapterKey) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            key,
        }
    }

    pub fn key(&self) -> ChapterKey {
        self.key
    }

    /// 小说级目录
    pub fn novel_dir(&self) -> PathBuf {
        self.root.join(self.key.novel_id.to_string())
    }

    /// 章节原图目录
    pub fn chapter_dir(&self) -> PathBuf {
        self.novel_dir().join(format!("ep{}", self.key.episode_order))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.chapter_dir().join(Self::EXPORT_DIR)
    }

    pub fn split_dir(&self) -> PathBuf {
        self.chapter_dir().join(Self::SPLIT_DIR)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.chapter_dir().join(Self::AUDIO_DIR)
    }

    /// 小说级水印
    pub fn novel_logo(&self) -> PathBuf {
        self.novel_dir().join(LOGO_FILE)
    }
}
