//! SQLite Chapter Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{ChapterRecord, ChapterRepositoryPort, RepositoryError};

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    novel_id: String,
    episode_order: i64,
    title: String,
    script: Option<String>,
    created_at: String,
    updated_at: String,
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        let script = row
            .script
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(ChapterRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            novel_id: Uuid::parse_str(&row.novel_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            episode_order: u32::try_from(row.episode_order)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            title: row.title,
            script,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError> {
        let script = chapter
            .script
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO chapters (id, novel_id, episode_order, title, script, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                novel_id = excluded.novel_id,
                episode_order = excluded.episode_order,
                title = excluded.title,
                script = excluded.script,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(chapter.id.to_string())
        .bind(chapter.novel_id.to_string())
        .bind(chapter.episode_order as i64)
        .bind(&chapter.title)
        .bind(script)
        .bind(chapter.created_at.to_rfc3339())
        .bind(chapter.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(
            "SELECT id, novel_id, episode_order, title, script, created_at, updated_at FROM chapters WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(ChapterRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, PoolConfig};
    use serde_json::json;

    async fn repo() -> SqliteChapterRepository {
        let pool = create_pool(&PoolConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteChapterRepository::new(pool)
    }

    fn record(script: Option<serde_json::Value>) -> ChapterRecord {
        let now = Utc::now();
        ChapterRecord {
            id: Uuid::new_v4(),
            novel_id: Uuid::new_v4(),
            episode_order: 12,
            title: "第十二话".to_string(),
            script,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = repo().await;
        let chapter = record(Some(json!([[[{"role": "hero", "content": "你好"}]]])));

        repo.save(&chapter).await.unwrap();
        let found = repo.find_by_id(chapter.id).await.unwrap().unwrap();

        assert_eq!(found.novel_id, chapter.novel_id);
        assert_eq!(found.episode_order, 12);
        assert_eq!(found.title, "第十二话");
        assert_eq!(found.script, chapter.script);
        assert_eq!(found.created_at.timestamp(), chapter.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_fields() {
        let repo = repo().await;
        let mut chapter = record(Some(json!([])));
        repo.save(&chapter).await.unwrap();

        chapter.title = "改名".to_string();
        chapter.script = None;
        repo.save(&chapter).await.unwrap();

        let found = repo.find_by_id(chapter.id).await.unwrap().unwrap();
        assert_eq!(found.title, "改名");
        assert!(found.script.is_none());
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let repo = repo().await;
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
