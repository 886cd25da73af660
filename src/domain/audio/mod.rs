//! Audio Context - 配音音频

mod wav;

pub use wav::{merge_with_trailer, WavClip, WavError, WavFormat, SHOT_TRAILER_MS};
