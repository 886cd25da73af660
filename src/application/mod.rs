//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ChapterRepository、SpeechSynthesizer、VoiceRegistry、MediaTranscoder）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - staging: 输出目录暂存与换入
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod staging;

// Re-exports
pub use commands::{
    // Chapter commands
    ExportPages,
    NarrateChapter,
    RegisterChapter,
    SplitPages,
    // Video commands
    ClearAllSlots,
    CleanSlot,
    DeleteSlot,
    MergeVideo,
    UploadSlot,
    // Handlers
    handlers::{
        ClearAllSlotsHandler, CleanSlotHandler, DeleteSlotHandler, ExportPagesHandler,
        MergeVideoHandler, NarrateChapterHandler, RegisterChapterHandler, SplitPagesHandler,
        UploadSlotHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Repositories
    ChapterRecord,
    ChapterRepositoryPort,
    RepositoryError,
    // Media transcoder
    MediaTranscoderPort,
    TranscodeError,
    // TTS engine
    SpeechSynthesizerPort,
    SynthesisRequest,
    SynthesisResponse,
    TtsError,
    // Voice registry
    VoiceProfile,
    VoiceRegistryPort,
};

pub use queries::{handlers::ListSlotsHandler, ListSlots};
