//! Voice Registry Port - 角色音色表

use std::path::PathBuf;

/// 角色音色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub character: String,
    /// 参考音频
    pub ref_audio_path: PathBuf,
    /// 参考音频对应的文本
    pub ref_text: String,
    /// 语言标签
    pub language: String,
}

/// Voice Registry Port
///
/// 角色键到音色的静态映射，由外部配置提供
pub trait VoiceRegistryPort: Send + Sync {
    fn resolve(&self, character: &str) -> Option<VoiceProfile>;

    /// 已登记的角色键
    fn characters(&self) -> Vec<String>;
}
