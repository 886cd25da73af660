//! Chapter HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{ExportPages, NarrateChapter, RegisterChapter, SplitPages};
use crate::infrastructure::http::dto::{
    ApiResponse, ChapterRequest, NarrateRequest, NarrationDto, PageBatchDto, RegisterChapterDto,
    RegisterChapterRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 登记章节（存在则更新标题与脚本）
pub async fn register_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterChapterRequest>,
) -> Result<Json<ApiResponse<RegisterChapterDto>>, ApiError> {
    let command = RegisterChapter {
        id: req.id,
        novel_id: req.novel_id,
        episode_order: req.episode_order,
        title: req.title,
        script: req.script,
    };

    let response = state.register_chapter_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 导出标准化页图
pub async fn export_pages(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<ApiResponse<PageBatchDto>>, ApiError> {
    let response = state
        .export_pages_handler
        .handle(ExportPages {
            chapter_id: req.chapter_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 四宫格切图
pub async fn split_pages(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChapterRequest>,
) -> Result<Json<ApiResponse<PageBatchDto>>, ApiError> {
    let response = state
        .split_pages_handler
        .handle(SplitPages {
            chapter_id: req.chapter_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 章节配音
pub async fn narrate_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NarrateRequest>,
) -> Result<Json<ApiResponse<NarrationDto>>, ApiError> {
    let response = state
        .narrate_chapter_handler
        .handle(NarrateChapter {
            chapter_id: req.chapter_id,
            script: req.script,
        })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}
