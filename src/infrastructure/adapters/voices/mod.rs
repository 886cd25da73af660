//! Voice Adapter - 静态音色表

mod static_registry;

pub use static_registry::StaticVoiceRegistry;
