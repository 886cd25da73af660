//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::application::commands::handlers::{
    ClearAllResponse, DeleteSlotResponse, MergeVideoResponse, NarrateChapterResponse,
    PageBatchResponse, RegisterChapterResponse, UploadSlotResponse,
};
use crate::application::queries::handlers::SlotEntry;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 视频工作目录中文件的访问路径
fn video_url(file_name: &str) -> String {
    format!("/video/{}", file_name)
}

// ============================================================================
// Chapter DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterChapterRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub novel_id: Uuid,
    pub episode_order: u32,
    pub title: String,
    #[serde(default)]
    pub script: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RegisterChapterDto {
    pub id: Uuid,
    pub created: bool,
    pub chapter_dir: String,
}

impl From<RegisterChapterResponse> for RegisterChapterDto {
    fn from(resp: RegisterChapterResponse) -> Self {
        Self {
            id: resp.id,
            created: resp.created,
            chapter_dir: resp.chapter_dir.display().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChapterRequest {
    pub chapter_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct NarrateRequest {
    pub chapter_id: Uuid,
    #[serde(default)]
    pub script: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PageBatchDto {
    pub requested: usize,
    pub processed: usize,
    pub files: Vec<String>,
    pub output_dir: String,
}

impl From<PageBatchResponse> for PageBatchDto {
    fn from(resp: PageBatchResponse) -> Self {
        Self {
            requested: resp.requested,
            processed: resp.processed,
            files: resp.files,
            output_dir: resp.output_dir.display().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NarrationDto {
    pub shots: usize,
    pub lines_requested: usize,
    pub lines_synthesized: usize,
    pub files: Vec<String>,
    pub output_dir: String,
}

impl From<NarrateChapterResponse> for NarrationDto {
    fn from(resp: NarrateChapterResponse) -> Self {
        Self {
            shots: resp.shots,
            lines_requested: resp.lines_requested,
            lines_synthesized: resp.lines_synthesized,
            files: resp.files,
            output_dir: resp.output_dir.display().to_string(),
        }
    }
}

// ============================================================================
// Video DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotIndexRequest {
    pub index: i64,
}

#[derive(Debug, Serialize)]
pub struct SlotDto {
    pub index: Option<u32>,
    pub file_name: String,
    pub size: u64,
    pub url: String,
}

impl From<SlotEntry> for SlotDto {
    fn from(entry: SlotEntry) -> Self {
        Self {
            url: video_url(&entry.file_name),
            index: entry.index,
            file_name: entry.file_name,
            size: entry.size,
        }
    }
}

impl From<UploadSlotResponse> for SlotDto {
    fn from(resp: UploadSlotResponse) -> Self {
        Self {
            url: video_url(&resp.file_name),
            index: Some(resp.slot.index()),
            file_name: resp.file_name,
            size: resp.size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteSlotDto {
    pub index: u32,
    pub removed: bool,
}

impl From<DeleteSlotResponse> for DeleteSlotDto {
    fn from(resp: DeleteSlotResponse) -> Self {
        Self {
            index: resp.slot.index(),
            removed: resp.removed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearAllDto {
    pub removed: usize,
}

impl From<ClearAllResponse> for ClearAllDto {
    fn from(resp: ClearAllResponse) -> Self {
        Self {
            removed: resp.removed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MergeDto {
    pub clips: Vec<u32>,
    pub with_music: bool,
    pub url: String,
}

impl From<MergeVideoResponse> for MergeDto {
    fn from(resp: MergeVideoResponse) -> Self {
        let file_name = resp
            .output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            clips: resp.clips,
            with_music: resp.with_music,
            url: video_url(&file_name),
        }
    }
}
