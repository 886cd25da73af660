//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod chapter_handlers;
mod narration_handlers;
mod page_handlers;
mod video_handlers;

pub use chapter_handlers::*;
pub use narration_handlers::*;
pub use page_handlers::*;
pub use video_handlers::*;
