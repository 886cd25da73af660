//! Video Commands
//!
//! 槽位序号保持请求中的原始整数，由处理器做范围校验。

/// 上传素材到槽位
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub index: i64,
    pub data: Vec<u8>,
}

/// 重新裁剪已有片段
#[derive(Debug, Clone)]
pub struct CleanSlot {
    pub index: i64,
}

/// 删除槽位文件
#[derive(Debug, Clone)]
pub struct DeleteSlot {
    pub index: i64,
}

/// 清空视频工作目录
#[derive(Debug, Clone, Default)]
pub struct ClearAllSlots;

/// 合成最终视频
#[derive(Debug, Clone, Default)]
pub struct MergeVideo;
