//! Domain Layer - 领域层
//!
//! 包含四个限界上下文:
//! - Chapter Context: 章节媒体目录、配音脚本
//! - Page Context: 页图命名与变换
//! - Audio Context: WAV 容器与合并
//! - Video Context: 视频槽位约定

pub mod audio;
pub mod chapter;
pub mod page;
pub mod video;
