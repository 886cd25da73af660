//! TTS Engine Port - 语音合成抽象
//!
//! 定义 TTS 推理的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成请求
///
/// 调优参数（采样、温度等）属于服务端静态配置，不随请求传递。
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本
    pub text: String,
    /// 文本语言
    pub text_lang: String,
    /// 参考音频路径
    pub ref_audio_path: PathBuf,
    /// 参考音频文本
    pub prompt_text: String,
    /// 参考音频语言
    pub prompt_lang: String,
    /// 角色键（用于日志和追踪）
    pub character: String,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 原始 WAV 数据
    pub audio_data: Vec<u8>,
}

/// Speech Synthesizer Port
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 合成单句
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError>;
}
