//! 视频槽位
//!
//! 工作目录为扁平结构：
//! - `bgm.mp3`      槽位 0，背景音乐，原样保存
//! - `{1..30}.mp4`  视频片段
//! - `output.mp4`   合成结果

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_CLIP_SLOT: u32 = 30;

pub const BGM_FILE: &str = "bgm.mp3";
pub const OUTPUT_FILE: &str = "output.mp4";
pub const CONCAT_LIST_FILE: &str = "mylist.txt";
pub const COMBINED_FILE: &str = "temp_combined.mp4";
pub const TEMP_PREFIX: &str = "temp_";

/// 清空操作会删除的扩展名
pub const MANAGED_EXTENSIONS: &[&str] = &["mp4", "mp3", "txt"];

/// 片段开头裁掉的时长（秒）
pub const TRIM_OFFSET_SECS: f64 = 0.1;
/// 背景音乐相对音量
pub const BGM_VOLUME: f64 = 0.7;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Invalid slot index: {0} (expected 0..={max})", max = MAX_CLIP_SLOT)]
    InvalidSlot(i64),

    #[error("Slot 0 is reserved for background music")]
    BackgroundMusicSlot,
}

/// 槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoSlot {
    BackgroundMusic,
    Clip(u32),
}

impl VideoSlot {
    pub fn from_index(index: i64) -> Result<Self, VideoError> {
        match index {
            0 => Ok(VideoSlot::BackgroundMusic),
            n if n >= 1 && n <= MAX_CLIP_SLOT as i64 => Ok(VideoSlot::Clip(n as u32)),
            n => Err(VideoError::InvalidSlot(n)),
        }
    }

    /// 仅接受视频片段槽位
    pub fn clip(index: i64) -> Result<u32, VideoError> {
        match Self::from_index(index)? {
            VideoSlot::Clip(n) => Ok(n),
            VideoSlot::BackgroundMusic => Err(VideoError::BackgroundMusicSlot),
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            VideoSlot::BackgroundMusic => 0,
            VideoSlot::Clip(n) => *n,
        }
    }

    /// 槽位的规范文件名
    pub fn file_name(&self) -> String {
        match self {
            VideoSlot::BackgroundMusic => BGM_FILE.to_string(),
            VideoSlot::Clip(n) => clip_file_name(*n),
        }
    }
}

pub fn clip_file_name(index: u32) -> String {
    format!("{}.mp4", index)
}

/// 解析 `^\d+\.mp4$` 形式的片段文件名
pub fn parse_clip_file_name(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_suffix(".mp4")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 是否为编辑器可见的素材（片段或背景音乐，排除合成结果和临时文件）
pub fn is_listed_material(file_name: &str) -> bool {
    if file_name == BGM_FILE {
        return true;
    }
    file_name.ends_with(".mp4") && file_name != OUTPUT_FILE && !file_name.starts_with(TEMP_PREFIX)
}

/// 是否为清空操作的目标
pub fn is_managed_file(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| MANAGED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// concat demuxer 清单内容
pub fn concat_manifest(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}
