//! Static Voice Registry - 由配置构建的角色音色表
//!
//! 来源：`[voices.<角色>]` 配置表，以及可选的 `tts.voices_file`。
//! 角色名不区分大小写（配置加载时键名已被转为小写）。

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::application::ports::{VoiceProfile, VoiceRegistryPort};
use crate::config::{AppConfig, ConfigError, VoiceConfig};

/// 音色表文件结构
#[derive(Debug, Default, Deserialize)]
struct VoicesFile {
    #[serde(default)]
    voices: HashMap<String, VoiceConfig>,
}

/// Static Voice Registry
#[derive(Debug, Clone, Default)]
pub struct StaticVoiceRegistry {
    voices: HashMap<String, VoiceProfile>,
}

impl StaticVoiceRegistry {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, VoiceConfig)>,
    {
        let voices = entries
            .into_iter()
            .map(|(character, voice)| {
                let key = normalize(&character);
                let profile = VoiceProfile {
                    character: key.clone(),
                    ref_audio_path: voice.ref_audio,
                    ref_text: voice.ref_text,
                    language: voice.language,
                };
                (key, profile)
            })
            .collect();
        Self { voices }
    }

    /// 文件中的条目先载入，`[voices]` 中的同名条目覆盖之
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut entries: Vec<(String, VoiceConfig)> = match &config.tts.voices_file {
            Some(path) => load_voices_file(path)?.into_iter().collect(),
            None => Vec::new(),
        };
        entries.extend(config.voices.iter().map(|(k, v)| (k.clone(), v.clone())));

        let registry = Self::new(entries);
        tracing::info!(characters = ?registry.characters(), "Voice registry loaded");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

fn normalize(character: &str) -> String {
    character.trim().to_lowercase()
}

fn load_voices_file(path: &Path) -> Result<HashMap<String, VoiceConfig>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;
    let file: VoicesFile = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
    Ok(file.voices)
}

impl VoiceRegistryPort for StaticVoiceRegistry {
    fn resolve(&self, character: &str) -> Option<VoiceProfile> {
        self.voices.get(&normalize(character)).cloned()
    }

    fn characters(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.voices.keys().cloned().collect();
        keys.sort();
        keys
    }
}
