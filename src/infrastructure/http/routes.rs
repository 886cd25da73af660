//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                   GET   健康检查
//! - /api/chapter/register       POST  登记章节
//! - /api/chapter/export_pages   POST  导出标准化页图
//! - /api/chapter/split_pages    POST  四宫格切图
//! - /api/chapter/narrate        POST  章节配音
//! - /api/video/list             GET   列出素材
//! - /api/video/upload           POST  上传素材（multipart）
//! - /api/video/clean            POST  重新裁剪片段
//! - /api/video/delete           POST  删除槽位
//! - /api/video/clear            POST  清空工作目录
//! - /api/video/merge            POST  合成最终视频
//! - /video/*                    GET   视频工作目录静态文件
//! - /outputs/*                  GET   生成物静态文件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use super::handlers;
use super::state::{AppState, MediaPaths};

/// 创建所有路由
pub fn create_routes(paths: &MediaPaths) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .nest_service("/video", ServeDir::new(&paths.video_dir))
        .nest_service("/outputs", ServeDir::new(&paths.outputs_dir))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/chapter", chapter_routes())
        .nest("/video", video_routes())
}

/// Chapter 路由
fn chapter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(handlers::register_chapter))
        .route("/export_pages", post(handlers::export_pages))
        .route("/split_pages", post(handlers::split_pages))
        .route("/narrate", post(handlers::narrate_chapter))
}

/// Video 路由
fn video_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_slots))
        .route("/upload", post(handlers::upload_slot))
        .route("/clean", post(handlers::clean_slot))
        .route("/delete", post(handlers::delete_slot))
        .route("/clear", post(handlers::clear_slots))
        .route("/merge", post(handlers::merge_video))
}
