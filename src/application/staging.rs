//! 输出目录的暂存与替换
//!
//! 输出先写入目标旁边的隐藏暂存目录，批处理结束后整体换入。

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::application::error::ApplicationError;

/// 暂存目录（未提交时 drop 会自动清理）
pub struct StagedDir {
    staging: TempDir,
    target: PathBuf,
}

impl StagedDir {
    /// 在 `target` 的父目录下创建暂存目录
    pub async fn begin(target: &Path) -> Result<Self, ApplicationError> {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                ApplicationError::storage(format!("Output dir has no parent: {}", target.display()))
            })?
            .to_path_buf();
        let prefix = format!(
            ".{}-staging-",
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );

        tokio::fs::create_dir_all(&parent).await?;
        let staging = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempdir_in(&parent)
        })
        .await
        .map_err(|e| ApplicationError::internal(format!("Staging task failed: {}", e)))??;

        Ok(Self {
            staging,
            target: target.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    /// 将暂存目录换入目标位置，旧目录移开后删除
    pub async fn commit(self) -> Result<PathBuf, ApplicationError> {
        let target = self.target;
        let staged = self.staging.keep();

        let retired = match tokio::fs::metadata(&target).await {
            Ok(_) => {
                let name = target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let aside = target.with_file_name(format!(".{}-old-{}", name, Uuid::new_v4()));
                if let Err(e) = tokio::fs::rename(&target, &aside).await {
                    let _ = tokio::fs::remove_dir_all(&staged).await;
                    return Err(e.into());
                }
                Some(aside)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&staged).await;
                return Err(e.into());
            }
        };

        if let Err(e) = tokio::fs::rename(&staged, &target).await {
            // 换入失败：恢复旧目录
            if let Some(aside) = &retired {
                let _ = tokio::fs::rename(aside, &target).await;
            }
            let _ = tokio::fs::remove_dir_all(&staged).await;
            return Err(e.into());
        }

        if let Some(aside) = retired {
            if let Err(e) = tokio::fs::remove_dir_all(&aside).await {
                tracing::warn!(path = %aside.display(), error = %e, "Failed to remove retired output dir");
            }
        }

        Ok(target)
    }
}
