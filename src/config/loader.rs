//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsEngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "AIMANGA";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `AIMANGA_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `AIMANGA_SERVER__PORT=8080`
/// - `AIMANGA_TTS__URL=http://tts-server:9880`
/// - `AIMANGA_TTS__ENGINE=fake`
/// - `AIMANGA_STORAGE__VIDEO_DIR=/srv/video`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("tts.engine", "http")?
        .set_default("tts.url", "http://127.0.0.1:9880")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("tts.max_concurrent_shots", 1)?
        .set_default("database.path", "data/aimanga.db")?
        .set_default("database.max_connections", 5)?
        .set_default("storage.images_dir", "assets/outputs/images")?
        .set_default("storage.video_dir", "assets/video")?
        .set_default("storage.outputs_dir", "assets/outputs")?
        .set_default("storage.max_upload_size", 50 * 1024 * 1024)?
        .set_default("media.ffmpeg_path", "ffmpeg")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: AIMANGA_TTS__URL=http://tts-server:9880
    // 注意: 键名会被转换为小写，音色表的角色名同样如此
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.engine == TtsEngineKind::Http && config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.max_concurrent_shots == 0 {
        return Err(ConfigError::ValidationError(
            "tts.max_concurrent_shots must be at least 1".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.media.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "media.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    for (character, voice) in &config.voices {
        if voice.ref_audio.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Voice '{}' has no ref_audio",
                character
            )));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("TTS Engine: {:?}", config.tts.engine);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("TTS Concurrent Shots: {}", config.tts.max_concurrent_shots);
    tracing::info!("Voices Configured: {}", config.voices.len());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Images Directory: {:?}", config.storage.images_dir);
    tracing::info!("Video Directory: {:?}", config.storage.video_dir);
    tracing::info!("Outputs Directory: {:?}", config.storage.outputs_dir);
    tracing::info!("FFmpeg: {:?}", config.media.ffmpeg_path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
