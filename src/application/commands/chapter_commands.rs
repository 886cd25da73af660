//! Chapter Commands

use serde_json::Value;
use uuid::Uuid;

/// 登记章节命令（存在则更新）
#[derive(Debug, Clone)]
pub struct RegisterChapter {
    /// 为空时生成新 ID
    pub id: Option<Uuid>,
    pub novel_id: Uuid,
    pub episode_order: u32,
    pub title: String,
    pub script: Option<Value>,
}

/// 导出标准化页图命令
#[derive(Debug, Clone)]
pub struct ExportPages {
    pub chapter_id: Uuid,
}

/// 四宫格切图命令（旧模式）
#[derive(Debug, Clone)]
pub struct SplitPages {
    pub chapter_id: Uuid,
}

/// 章节配音命令
#[derive(Debug, Clone)]
pub struct NarrateChapter {
    pub chapter_id: Uuid,
    /// 为空时使用章节记录中保存的脚本
    pub script: Option<Value>,
}
