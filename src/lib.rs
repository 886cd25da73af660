//! AI Manga - 章节媒体流水线
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Chapter: 章节媒体目录、配音脚本
//! - Page: 页图命名、缩放水印、四宫格切图
//! - Audio: WAV 解析与分镜合并
//! - Video: 槽位与工作目录约定
//!
//! 应用层 (application/):
//! - Ports: ChapterRepository, SpeechSynthesizer, VoiceRegistry, MediaTranscoder
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: JSON API + 静态文件
//! - Persistence: SQLite 章节记录
//! - Adapters: TTS 客户端、ffmpeg、音色表

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
