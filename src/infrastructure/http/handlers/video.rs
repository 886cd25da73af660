//! Video HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::application::{ClearAllSlots, CleanSlot, DeleteSlot, ListSlots, MergeVideo, UploadSlot};
use crate::infrastructure::http::dto::{
    ApiResponse, ClearAllDto, DeleteSlotDto, MergeDto, SlotDto, SlotIndexRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出视频工作目录中的素材
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SlotDto>>>, ApiError> {
    let entries = state.list_slots_handler.handle(ListSlots).await?;
    let items = entries.into_iter().map(SlotDto::from).collect();
    Ok(Json(ApiResponse::success(items)))
}

/// 上传素材
///
/// multipart 字段：`index`（0 为背景音乐，1..=30 为片段）、`file`
pub async fn upload_slot(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<SlotDto>>, ApiError> {
    let mut index: Option<i64> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "index" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read index: {}", e)))?;
                let parsed = text.trim().parse::<i64>().map_err(|_| {
                    ApiError::BadRequest(format!("Invalid slot index: {}", text.trim()))
                })?;
                index = Some(parsed);
            }
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                data = Some(bytes.to_vec());
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let index = index.ok_or_else(|| ApiError::BadRequest("Missing field: index".to_string()))?;
    let data = data.ok_or_else(|| ApiError::BadRequest("Missing field: file".to_string()))?;

    let response = state
        .upload_slot_handler
        .handle(UploadSlot { index, data })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 重新裁剪已有片段
pub async fn clean_slot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SlotIndexRequest>,
) -> Result<Json<ApiResponse<SlotDto>>, ApiError> {
    let response = state
        .clean_slot_handler
        .handle(CleanSlot { index: req.index })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 删除槽位文件
pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SlotIndexRequest>,
) -> Result<Json<ApiResponse<DeleteSlotDto>>, ApiError> {
    let response = state
        .delete_slot_handler
        .handle(DeleteSlot { index: req.index })
        .await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 清空视频工作目录
pub async fn clear_slots(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearAllDto>>, ApiError> {
    let response = state.clear_all_handler.handle(ClearAllSlots).await?;
    Ok(Json(ApiResponse::success(response.into())))
}

/// 合成最终视频
pub async fn merge_video(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<MergeDto>>, ApiError> {
    let response = state.merge_video_handler.handle(MergeVideo).await?;
    Ok(Json(ApiResponse::success(response.into())))
}
