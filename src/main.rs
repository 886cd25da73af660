//! AI Manga - 章节媒体流水线服务
//!
//! - Domain: chapter/, page/, audio/, video/
//! - Application: commands, queries, ports
//! - Infrastructure: http, persistence, adapters

use std::sync::Arc;

use aimanga::application::{SpeechSynthesizerPort, VoiceRegistryPort};
use aimanga::config::{load_config, print_config, AppConfig, TtsEngineKind};
use aimanga::infrastructure::adapters::{
    FakeTtsClient, FakeTtsClientConfig, FfmpegTranscoder, HttpTtsClient, HttpTtsClientConfig,
    StaticVoiceRegistry, TtsTuning,
};
use aimanga::infrastructure::http::{AppState, HttpServer, MediaPaths, ServerConfig};
use aimanga::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, PoolConfig, SqliteChapterRepository,
};

/// 初始化日志（RUST_LOG 优先于配置）
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},aimanga={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 按配置选择 TTS 引擎
fn build_synthesizer(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechSynthesizerPort>> {
    match config.tts.engine {
        TtsEngineKind::Http => {
            let tuning = TtsTuning {
                top_k: config.tts.top_k,
                top_p: config.tts.top_p,
                temperature: config.tts.temperature,
                text_split_method: config.tts.text_split_method.clone(),
                batch_size: config.tts.batch_size,
                speed_factor: config.tts.speed_factor,
            };
            let client_config = HttpTtsClientConfig::new(&config.tts.url)
                .with_timeout(config.tts.timeout_secs)
                .with_tuning(tuning);
            Ok(Arc::new(HttpTtsClient::new(client_config)?))
        }
        TtsEngineKind::Fake => Ok(Arc::new(FakeTtsClient::new(FakeTtsClientConfig::default()))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    for dir in [
        &config.storage.images_dir,
        &config.storage.video_dir,
        &config.storage.outputs_dir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }

    // 初始化数据库
    let pool = create_pool(&PoolConfig::from(&config.database)).await?;
    run_migrations(&pool).await?;
    let chapter_repo = Arc::new(SqliteChapterRepository::new(pool));

    // 外部适配器
    let synthesizer = build_synthesizer(&config)?;
    let voices: Arc<dyn VoiceRegistryPort> = Arc::new(StaticVoiceRegistry::from_config(&config)?);
    let transcoder = Arc::new(FfmpegTranscoder::new(&config.media.ffmpeg_path));

    let paths = MediaPaths {
        images_dir: config.storage.images_dir.clone(),
        video_dir: config.storage.video_dir.clone(),
        outputs_dir: config.storage.outputs_dir.clone(),
    };
    let state = AppState::new(
        chapter_repo,
        synthesizer,
        voices,
        transcoder,
        paths,
        config.tts.max_concurrent_shots,
    );

    let body_limit = usize::try_from(config.storage.max_upload_size).unwrap_or(usize::MAX);
    let server_config =
        ServerConfig::new(&config.server.host, config.server.port).with_body_limit(body_limit);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
