//! Media Transcoder Port - 外部转码工具抽象
//!
//! 裁剪重编码、无损拼接、背景音乐混音三种操作。
//! 成功的判定：进程退出码为 0 且声明的输出文件存在。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Failed to launch transcoder: {0}")]
    Spawn(String),

    #[error("Transcoder {operation} failed ({status}): {diagnostic}")]
    ProcessFailed {
        operation: &'static str,
        status: String,
        diagnostic: String,
    },

    #[error("Transcoder {operation} produced no output: {}", path.display())]
    MissingOutput {
        operation: &'static str,
        path: PathBuf,
    },

    #[error("IO error: {0}")]
    Io(String),
}

/// Media Transcoder Port
#[async_trait]
pub trait MediaTranscoderPort: Send + Sync {
    /// 裁掉开头 `offset_secs` 秒并重新编码（H.264 + AAC）
    async fn trim_reencode(
        &self,
        input: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<(), TranscodeError>;

    /// 按清单文件无损拼接（stream copy）
    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), TranscodeError>;

    /// 将背景音乐按相对音量混入视频原声，以视频时长为准，视频流直接复制
    async fn mix_background(
        &self,
        video: &Path,
        music: &Path,
        output: &Path,
        music_volume: f64,
    ) -> Result<(), TranscodeError>;
}
