//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod media_transcoder;
mod repositories;
mod tts_engine;
mod voice_registry;

pub use media_transcoder::{MediaTranscoderPort, TranscodeError};
pub use repositories::{ChapterRecord, ChapterRepositoryPort, RepositoryError};
pub use tts_engine::{SpeechSynthesizerPort, SynthesisRequest, SynthesisResponse, TtsError};
pub use voice_registry::{VoiceProfile, VoiceRegistryPort};
