//! Fake TTS Client - 不依赖外部服务的 TTS 客户端
//!
//! 按固定时长生成静音 WAV，用于本地联调

use async_trait::async_trait;

use crate::application::ports::{SpeechSynthesizerPort, SynthesisRequest, SynthesisResponse, TtsError};
use crate::domain::audio::{WavClip, WavFormat};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 每句返回的音频时长（毫秒）
    pub duration_ms: u32,
    /// 采样率
    pub sample_rate: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            sample_rate: 32000,
            latency_ms: 50,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            duration_ms = config.duration_ms,
            sample_rate = config.sample_rate,
            "FakeTtsClient initialized"
        );
        Self { config }
    }
}

#[async_trait]
impl SpeechSynthesizerPort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        tracing::debug!(
            character = %request.character,
            text_len = request.text.len(),
            "FakeTtsClient: returning silence"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        let clip = WavClip::silence(
            WavFormat::pcm16(self.config.sample_rate, 1),
            self.config.duration_ms,
        );
        Ok(SynthesisResponse {
            audio_data: clip.to_bytes(),
        })
    }
}
