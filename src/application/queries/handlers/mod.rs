//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod video_handlers;

pub use video_handlers::*;
