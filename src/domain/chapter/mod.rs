//! Chapter Context - 章节限界上下文
//!
//! 职责:
//! - 章节媒体目录定位
//! - 配音脚本结构

mod errors;
mod script;
mod value_objects;

pub use errors::ChapterError;
pub use script::{shot_audio_file_name, NarrationScript, ScriptLine, ScriptPage, ScriptShot};
pub use value_objects::{ChapterKey, ChapterMediaFolder};
