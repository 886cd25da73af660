//! Narration Command Handler
//!
//! 逐句调用 TTS，按分镜合并为一个 WAV 并追加静音尾巴。

use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::chapter_handlers::find_chapter;
use crate::application::commands::NarrateChapter;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ChapterRepositoryPort, SpeechSynthesizerPort, SynthesisRequest, VoiceRegistryPort,
};
use crate::application::staging::StagedDir;
use crate::domain::audio::{merge_with_trailer, WavClip, SHOT_TRAILER_MS};
use crate::domain::chapter::{shot_audio_file_name, ChapterMediaFolder, NarrationScript, ScriptLine};

/// 配音响应
#[derive(Debug, Clone)]
pub struct NarrateChapterResponse {
    pub shots: usize,
    pub lines_requested: usize,
    pub lines_synthesized: usize,
    /// 写出的分镜音频（按脚本顺序）
    pub files: Vec<String>,
    pub output_dir: PathBuf,
}

/// 单个分镜的处理单元
struct ShotJob {
    page: usize,
    shot: usize,
    file_name: String,
    lines: Vec<ScriptLine>,
}

#[derive(Debug, Default)]
struct ShotOutcome {
    file_name: Option<String>,
    synthesized: usize,
}

/// NarrateChapter Handler
pub struct NarrateChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    voices: Arc<dyn VoiceRegistryPort>,
    images_dir: PathBuf,
    max_concurrent_shots: usize,
}

impl NarrateChapterHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        voices: Arc<dyn VoiceRegistryPort>,
        images_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            chapter_repo,
            synthesizer,
            voices,
            images_dir: images_dir.as_ref().to_path_buf(),
            max_concurrent_shots: 1,
        }
    }

    /// 同时处理的分镜数上限（至少为 1）
    pub fn with_max_concurrent_shots(mut self, max: usize) -> Self {
        self.max_concurrent_shots = max.max(1);
        self
    }

    pub async fn handle(
        &self,
        command: NarrateChapter,
    ) -> Result<NarrateChapterResponse, ApplicationError> {
        let chapter = find_chapter(self.chapter_repo.as_ref(), command.chapter_id).await?;
        let folder = ChapterMediaFolder::new(&self.images_dir, chapter.key());

        let script_value = command.script.or(chapter.script).ok_or_else(|| {
            ApplicationError::validation(format!(
                "No script supplied and none stored for chapter {}",
                chapter.id
            ))
        })?;
        let script = NarrationScript::from_json(&script_value)?;

        let jobs: Vec<ShotJob> = script
            .pages
            .iter()
            .enumerate()
            .flat_map(|(page_idx, page)| {
                let shots_in_page = page.shots.len();
                page.shots.iter().enumerate().map(move |(shot_idx, shot)| ShotJob {
                    page: page_idx + 1,
                    shot: shot_idx + 1,
                    file_name: shot_audio_file_name(page_idx + 1, shot_idx + 1, shots_in_page),
                    lines: shot.lines.clone(),
                })
            })
            .collect();

        let staged = StagedDir::begin(&folder.audio_dir()).await?;
        let out_dir = staged.path().to_path_buf();

        let outcomes: Vec<ShotOutcome> = stream::iter(jobs)
            .map(|job| self.render_shot(job, &out_dir))
            .buffered(self.max_concurrent_shots)
            .collect()
            .await;

        let output_dir = staged.commit().await?;

        let lines_synthesized = outcomes.iter().map(|o| o.synthesized).sum();
        let files: Vec<String> = outcomes.into_iter().filter_map(|o| o.file_name).collect();

        tracing::info!(
            chapter = %folder.key(),
            shots = script.shot_count(),
            lines_requested = script.line_count(),
            lines_synthesized,
            files = files.len(),
            "Chapter narrated"
        );

        Ok(NarrateChapterResponse {
            shots: script.shot_count(),
            lines_requested: script.line_count(),
            lines_synthesized,
            files,
            output_dir,
        })
    }

    /// 分镜内逐句顺序合成，合并后写出
    async fn render_shot(&self, job: ShotJob, out_dir: &Path) -> ShotOutcome {
        let mut clips = Vec::with_capacity(job.lines.len());
        for line in &job.lines {
            if let Some(clip) = self.synthesize_line(line).await {
                clips.push(clip);
            }
        }

        let synthesized = clips.len();
        let Some(merged) = merge_with_trailer(&clips, SHOT_TRAILER_MS) else {
            tracing::warn!(page = job.page, shot = job.shot, "No usable lines, shot skipped");
            return ShotOutcome::default();
        };

        let path = out_dir.join(&job.file_name);
        if let Err(e) = tokio::fs::write(&path, merged.to_bytes()).await {
            tracing::error!(path = %path.display(), error = %e, "Failed to write shot audio");
            return ShotOutcome {
                file_name: None,
                synthesized,
            };
        }

        tracing::debug!(
            file = %job.file_name,
            clips = synthesized,
            duration_ms = merged.duration_ms(),
            "Shot audio written"
        );

        ShotOutcome {
            file_name: Some(job.file_name),
            synthesized,
        }
    }

    /// 合成单句；任何失败都只跳过该句
    async fn synthesize_line(&self, line: &ScriptLine) -> Option<WavClip> {
        let Some(voice) = self.voices.resolve(&line.role) else {
            tracing::warn!(role = %line.role, "Unknown role, line skipped");
            return None;
        };

        if !tokio::fs::try_exists(&voice.ref_audio_path).await.unwrap_or(false) {
            tracing::warn!(
                role = %line.role,
                ref_audio = %voice.ref_audio_path.display(),
                "Reference audio missing, line skipped"
            );
            return None;
        }

        let request = SynthesisRequest {
            text: line.content.clone(),
            text_lang: voice.language.clone(),
            ref_audio_path: voice.ref_audio_path.clone(),
            prompt_text: voice.ref_text.clone(),
            prompt_lang: voice.language.clone(),
            character: voice.character.clone(),
        };

        let response = match self.synthesizer.synthesize(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(role = %line.role, error = %e, "Synthesis failed, line skipped");
                return None;
            }
        };

        match WavClip::parse(&response.audio_data) {
            Ok(clip) => Some(clip),
            Err(e) => {
                tracing::warn!(role = %line.role, error = %e, "Unreadable synthesis output, line skipped");
                None
            }
        }
    }
}
