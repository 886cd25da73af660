//! HTTP Handlers

mod chapter;
mod ping;
mod video;

pub use chapter::*;
pub use ping::*;
pub use video::*;
