//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 前置条件不满足（源目录缺失、无可处理文件等）
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务/外部进程错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建前置条件错误
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// 创建存储错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<crate::application::ports::TranscodeError> for ApplicationError {
    fn from(err: crate::application::ports::TranscodeError) -> Self {
        match err {
            crate::application::ports::TranscodeError::Io(msg) => Self::StorageError(msg),
            other => Self::ExternalServiceError(other.to_string()),
        }
    }
}

impl From<crate::domain::chapter::ChapterError> for ApplicationError {
    fn from(err: crate::domain::chapter::ChapterError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<crate::domain::video::VideoError> for ApplicationError {
    fn from(err: crate::domain::video::VideoError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}
