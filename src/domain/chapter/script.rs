//! 配音脚本结构
//!
//! 脚本为三层嵌套数组：页 → 分镜 → 台词。
//! 顺序即播放顺序，解析时严格保留。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ChapterError;

/// 单句台词
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    /// 角色键（用于查找音色）
    #[serde(alias = "character", alias = "speaker")]
    pub role: String,
    /// 台词文本
    #[serde(alias = "text")]
    pub content: String,
}

/// 分镜
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptShot {
    pub lines: Vec<ScriptLine>,
    /// 无法解析的台词条目数
    pub malformed: usize,
}

impl ScriptShot {
    /// 台词总数（含无法解析的条目）
    pub fn requested(&self) -> usize {
        self.lines.len() + self.malformed
    }
}

/// 页
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptPage {
    pub shots: Vec<ScriptShot>,
}

/// 整章配音脚本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationScript {
    pub pages: Vec<ScriptPage>,
}

impl NarrationScript {
    /// 从 JSON 解析
    ///
    /// 页、分镜两层必须是数组，否则整体失败；
    /// 单条台词解析失败只计入 `malformed`。
    pub fn from_json(value: &Value) -> Result<Self, ChapterError> {
        let pages = value.as_array().ok_or_else(|| {
            ChapterError::MalformedScript("script must be an array of pages".to_string())
        })?;

        let mut script = NarrationScript::default();
        for (page_idx, page) in pages.iter().enumerate() {
            let shots = page.as_array().ok_or_else(|| {
                ChapterError::MalformedScript(format!(
                    "page {} must be an array of shots",
                    page_idx + 1
                ))
            })?;

            let mut script_page = ScriptPage::default();
            for (shot_idx, shot) in shots.iter().enumerate() {
                let lines = shot.as_array().ok_or_else(|| {
                    ChapterError::MalformedScript(format!(
                        "shot {}-{} must be an array of lines",
                        page_idx + 1,
                        shot_idx + 1
                    ))
                })?;

                let mut script_shot = ScriptShot::default();
                for line in lines {
                    match ScriptLine::deserialize(line) {
                        Ok(line) => script_shot.lines.push(line),
                        Err(e) => {
                            tracing::warn!(
                                page = page_idx + 1,
                                shot = shot_idx + 1,
                                error = %e,
                                "Skipping malformed script line"
                            );
                            script_shot.malformed += 1;
                        }
                    }
                }
                script_page.shots.push(script_shot);
            }
            script.pages.push(script_page);
        }

        Ok(script)
    }

    pub fn shot_count(&self) -> usize {
        self.pages.iter().map(|p| p.shots.len()).sum()
    }

    pub fn line_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| p.shots.iter())
            .map(ScriptShot::requested)
            .sum()
    }
}

/// 分镜音频文件名
///
/// 页内只有一个分镜时仅用页码，否则为 `页码-分镜号`（均从 1 开始）。
pub fn shot_audio_file_name(page_number: usize, shot_number: usize, shots_in_page: usize) -> String {
    if shots_in_page == 1 {
        format!("{}.wav", page_number)
    } else {
        format!("{}-{}.wav", page_number, shot_number)
    }
}
