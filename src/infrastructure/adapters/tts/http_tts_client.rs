//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 SpeechSynthesizerPort trait，通过 HTTP 调用外部 TTS 服务
//!
//! 外部 TTS API:
//! POST http://127.0.0.1:9880/tts
//! Request: {"text": "...", "ref_audio_path": "...", "prompt_text": "...", ...}  (JSON)
//! Response: audio/wav binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechSynthesizerPort, SynthesisRequest, SynthesisResponse, TtsError};

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    text_lang: &'a str,
    /// 参考音频路径（TTS 服务本地可读）
    ref_audio_path: String,
    prompt_text: &'a str,
    prompt_lang: &'a str,
    top_k: u32,
    top_p: f32,
    temperature: f32,
    text_split_method: &'a str,
    batch_size: u32,
    speed_factor: f32,
    media_type: &'static str,
    streaming_mode: bool,
}

/// 推理调优参数（服务端静态配置）
#[derive(Debug, Clone, PartialEq)]
pub struct TtsTuning {
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    pub text_split_method: String,
    pub batch_size: u32,
    pub speed_factor: f32,
}

impl Default for TtsTuning {
    fn default() -> Self {
        Self {
            top_k: 5,
            top_p: 1.0,
            temperature: 1.0,
            text_split_method: "cut5".to_string(),
            batch_size: 1,
            speed_factor: 1.0,
        }
    }
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub tuning: TtsTuning,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9880".to_string(),
            timeout_secs: 120,
            tuning: TtsTuning::default(),
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_tuning(mut self, tuning: TtsTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 获取推理 URL
    fn tts_url(&self) -> String {
        format!("{}/tts", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a SynthesisRequest) -> TtsHttpRequest<'a> {
        let tuning = &self.config.tuning;
        TtsHttpRequest {
            text: &request.text,
            text_lang: &request.text_lang,
            ref_audio_path: request.ref_audio_path.to_string_lossy().into_owned(),
            prompt_text: &request.prompt_text,
            prompt_lang: &request.prompt_lang,
            top_k: tuning.top_k,
            top_p: tuning.top_p,
            temperature: tuning.temperature,
            text_split_method: &tuning.text_split_method,
            batch_size: tuning.batch_size,
            speed_factor: tuning.speed_factor,
            media_type: "wav",
            streaming_mode: false,
        }
    }
}

#[async_trait]
impl SpeechSynthesizerPort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        let body = self.build_body(&request);

        tracing::debug!(
            url = %self.tts_url(),
            character = %request.character,
            text_len = request.text.len(),
            ref_audio = %body.ref_audio_path,
            "Sending TTS request"
        );

        let response = self
            .client
            .post(self.tts_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        tracing::debug!(
            character = %request.character,
            audio_size = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(SynthesisResponse { audio_data })
    }
}
