//! Infrastructure Layer - 基础设施层
//!
//! - adapters: TTS 客户端、ffmpeg、音色表
//! - persistence: SQLite 章节记录
//! - http: Axum API

pub mod adapters;
pub mod http;
pub mod persistence;
