//! Video Queries

/// 列出视频工作目录中的素材
#[derive(Debug, Clone, Default)]
pub struct ListSlots;
