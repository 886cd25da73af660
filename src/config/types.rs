//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 外部媒体工具配置
    #[serde(default)]
    pub media: MediaConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,

    /// 角色音色表（键为角色名，加载后统一为小写）
    #[serde(default)]
    pub voices: HashMap<String, VoiceConfig>,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TTS 引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngineKind {
    /// 调用外部 HTTP 服务
    #[default]
    Http,
    /// 本地生成静音（联调用）
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub engine: TtsEngineKind,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 同时合成的分镜数
    #[serde(default = "default_max_concurrent_shots")]
    pub max_concurrent_shots: usize,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_unit_f32")]
    pub top_p: f32,

    #[serde(default = "default_unit_f32")]
    pub temperature: f32,

    /// 服务端切句方式
    #[serde(default = "default_text_split_method")]
    pub text_split_method: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_unit_f32")]
    pub speed_factor: f32,

    /// 额外的音色表文件（TOML，格式同 `[voices]`）
    #[serde(default)]
    pub voices_file: Option<PathBuf>,
}

fn default_tts_url() -> String {
    "http://127.0.0.1:9880".to_string()
}

fn default_tts_timeout() -> u64 {
    120
}

fn default_max_concurrent_shots() -> usize {
    1
}

fn default_top_k() -> u32 {
    5
}

fn default_unit_f32() -> f32 {
    1.0
}

fn default_text_split_method() -> String {
    "cut5".to_string()
}

fn default_batch_size() -> u32 {
    1
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngineKind::default(),
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            max_concurrent_shots: default_max_concurrent_shots(),
            top_k: default_top_k(),
            top_p: default_unit_f32(),
            temperature: default_unit_f32(),
            text_split_method: default_text_split_method(),
            batch_size: default_batch_size(),
            speed_factor: default_unit_f32(),
            voices_file: None,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/aimanga.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 章节页图根目录（`{images_dir}/{novel_id}/ep{n}`）
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// 视频工作目录
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,

    /// 生成物根目录，以 `/outputs` 对外提供
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,

    /// 上传文件最大大小（字节），默认 50MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("assets/outputs/images")
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("assets/video")
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("assets/outputs")
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            video_dir: default_video_dir(),
            outputs_dir: default_outputs_dir(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// 外部媒体工具配置
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// 单个角色的音色
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceConfig {
    /// 参考音频路径（TTS 服务可读）
    pub ref_audio: PathBuf,

    /// 参考音频文本
    #[serde(default)]
    pub ref_text: String,

    /// 语言标签
    #[serde(default = "default_voice_language")]
    pub language: String,
}

fn default_voice_language() -> String {
    "zh".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.tts.url, "http://127.0.0.1:9880");
        assert_eq!(config.tts.engine, TtsEngineKind::Http);
        assert_eq!(config.tts.max_concurrent_shots, 1);
        assert_eq!(config.database.path, "data/aimanga.db");
        assert_eq!(config.storage.video_dir, PathBuf::from("assets/video"));
        assert!(config.voices.is_empty());
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_database_url() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_url(), "sqlite:data/aimanga.db?mode=rwc");
    }

    #[test]
    fn test_voice_language_default() {
        let voice: VoiceConfig = toml::from_str(r#"ref_audio = "voices/hero.wav""#).unwrap();
        assert_eq!(voice.language, "zh");
        assert!(voice.ref_text.is_empty());
    }
}
