//! Transdoc Error Types
//!
//! 애플리케이션 전역 에러 타입 정의 및 HTTP 응답 매핑

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Transdoc 애플리케이션 에러
#[derive(Error, Debug)]
pub enum TransdocError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to acquire database lock")]
    LockPoisoned,

    #[error("Not authenticated")]
    NotAuthenticated,

    /// 존재하지 않음과 소유자가 아님을 구분하지 않는다.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

/// HTTP 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl TransdocError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            TransdocError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR"),
            TransdocError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            TransdocError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            TransdocError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            TransdocError::LockPoisoned => (StatusCode::INTERNAL_SERVER_ERROR, "LOCK_ERROR"),
            TransdocError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            TransdocError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TransdocError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            TransdocError::MissingApiKey(_) => (StatusCode::SERVICE_UNAVAILABLE, "API_KEY_MISSING"),
            TransdocError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl From<&TransdocError> for ApiError {
    fn from(error: &TransdocError) -> Self {
        let (status, code) = error.status_and_code();

        // 내부 에러 상세는 로그로만 남긴다
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred".to_string()
        } else {
            error.to_string()
        };

        ApiError {
            code: code.to_string(),
            message,
            details: None,
        }
    }
}

impl IntoResponse for TransdocError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        (status, Json(ApiError::from(&self))).into_response()
    }
}

/// 핸들러 결과 타입
pub type ApiResult<T> = Result<T, TransdocError>;
