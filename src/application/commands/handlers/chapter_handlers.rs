//! Chapter Command Handlers

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::RegisterChapter;
use crate::application::error::ApplicationError;
use crate::application::ports::{ChapterRecord, ChapterRepositoryPort};
use crate::domain::chapter::{ChapterKey, ChapterMediaFolder, NarrationScript};

/// 登记章节响应
#[derive(Debug, Clone)]
pub struct RegisterChapterResponse {
    pub id: Uuid,
    pub created: bool,
    pub chapter_dir: PathBuf,
}

/// RegisterChapter Handler
pub struct RegisterChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    images_dir: PathBuf,
}

impl RegisterChapterHandler {
    pub fn new(chapter_repo: Arc<dyn ChapterRepositoryPort>, images_dir: impl AsRef<Path>) -> Self {
        Self {
            chapter_repo,
            images_dir: images_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn handle(
        &self,
        command: RegisterChapter,
    ) -> Result<RegisterChapterResponse, ApplicationError> {
        if command.title.trim().is_empty() {
            return Err(ApplicationError::validation("Chapter title cannot be empty"));
        }
        if let Some(script) = &command.script {
            NarrationScript::from_json(script)?;
        }

        let id = command.id.unwrap_or_else(Uuid::new_v4);
        let existing = self.chapter_repo.find_by_id(id).await?;
        let now = Utc::now();

        let record = ChapterRecord {
            id,
            novel_id: command.novel_id,
            episode_order: command.episode_order,
            title: command.title,
            script: command.script,
            created_at: existing.as_ref().map(|c| c.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.chapter_repo.save(&record).await?;

        let folder = ChapterMediaFolder::new(
            &self.images_dir,
            ChapterKey::new(record.novel_id, record.episode_order),
        );
        let chapter_dir = folder.chapter_dir();
        tokio::fs::create_dir_all(&chapter_dir).await?;

        tracing::info!(
            chapter_id = %id,
            chapter = %folder.key(),
            created = existing.is_none(),
            "Chapter registered"
        );

        Ok(RegisterChapterResponse {
            id,
            created: existing.is_none(),
            chapter_dir,
        })
    }
}

/// 读取章节记录，不存在时返回 NotFound
pub(crate) async fn find_chapter(
    chapter_repo: &dyn ChapterRepositoryPort,
    chapter_id: Uuid,
) -> Result<ChapterRecord, ApplicationError> {
    chapter_repo
        .find_by_id(chapter_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))
}
