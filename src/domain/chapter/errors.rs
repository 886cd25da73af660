//! Chapter Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("脚本格式错误: {0}")]
    MalformedScript(String),
}
