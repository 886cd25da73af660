//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    // Command handlers
    ClearAllSlotsHandler, CleanSlotHandler, DeleteSlotHandler, ExportPagesHandler,
    MergeVideoHandler, NarrateChapterHandler, RegisterChapterHandler, SplitPagesHandler,
    UploadSlotHandler,
    // Query handlers
    ListSlotsHandler,
    // Ports
    ChapterRepositoryPort, MediaTranscoderPort, SpeechSynthesizerPort, VoiceRegistryPort,
};

/// 媒体目录
#[derive(Debug, Clone)]
pub struct MediaPaths {
    /// 章节页图根目录
    pub images_dir: PathBuf,
    /// 视频工作目录（`/video`）
    pub video_dir: PathBuf,
    /// 生成物根目录（`/outputs`）
    pub outputs_dir: PathBuf,
}

/// 应用状态
pub struct AppState {
    pub paths: MediaPaths,

    // ========== Command Handlers ==========
    pub register_chapter_handler: RegisterChapterHandler,
    pub export_pages_handler: ExportPagesHandler,
    pub split_pages_handler: SplitPagesHandler,
    pub narrate_chapter_handler: NarrateChapterHandler,
    pub upload_slot_handler: UploadSlotHandler,
    pub clean_slot_handler: CleanSlotHandler,
    pub delete_slot_handler: DeleteSlotHandler,
    pub clear_all_handler: ClearAllSlotsHandler,
    pub merge_video_handler: MergeVideoHandler,

    // ========== Query Handlers ==========
    pub list_slots_handler: ListSlotsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        voices: Arc<dyn VoiceRegistryPort>,
        transcoder: Arc<dyn MediaTranscoderPort>,
        paths: MediaPaths,
        max_concurrent_shots: usize,
    ) -> Self {
        let images_dir = &paths.images_dir;
        let video_dir = &paths.video_dir;

        Self {
            // Command handlers
            register_chapter_handler: RegisterChapterHandler::new(chapter_repo.clone(), images_dir),
            export_pages_handler: ExportPagesHandler::new(chapter_repo.clone(), images_dir),
            split_pages_handler: SplitPagesHandler::new(chapter_repo.clone(), images_dir),
            narrate_chapter_handler: NarrateChapterHandler::new(
                chapter_repo.clone(),
                synthesizer,
                voices,
                images_dir,
            )
            .with_max_concurrent_shots(max_concurrent_shots),
            upload_slot_handler: UploadSlotHandler::new(transcoder.clone(), video_dir),
            clean_slot_handler: CleanSlotHandler::new(transcoder.clone(), video_dir),
            delete_slot_handler: DeleteSlotHandler::new(video_dir),
            clear_all_handler: ClearAllSlotsHandler::new(video_dir),
            merge_video_handler: MergeVideoHandler::new(transcoder, video_dir),

            // Query handlers
            list_slots_handler: ListSlotsHandler::new(video_dir),

            paths,
        }
    }
}
