//! HTTP Error Handling
//!
//! 业务错误统一以 HTTP 200 + errno 返回

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    /// 失败类别
    pub kind: &'static str,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            kind,
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const PRECONDITION_FAILED: i32 = 412;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    PreconditionFailed(String),
    ServiceUnavailable(String),
    Storage(String),
    Internal(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::PreconditionFailed(_) => errno::PRECONDITION_FAILED,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) | ApiError::Internal(_) => errno::INTERNAL_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "validation",
            ApiError::PreconditionFailed(_) => "precondition_failed",
            ApiError::ServiceUnavailable(_) => "external_service",
            ApiError::Storage(_) => "storage",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::PreconditionFailed(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Storage(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let kind = self.kind();
        let msg = self.message();

        if errno >= errno::INTERNAL_ERROR {
            tracing::error!(errno, kind, error = %msg, "Request failed");
        } else {
            tracing::warn!(errno, kind, error = %msg, "Request rejected");
        }

        (StatusCode::OK, Json(ErrorResponse::new(errno, kind, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::PreconditionFailed(msg) => ApiError::PreconditionFailed(msg),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::StorageError(msg) => ApiError::Storage(msg),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
