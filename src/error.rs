//! Application Error Taxonomy
//!
//! Every service produces errors from its own module-level enum; they all
//! converge here for translation to HTTP responses. The HTTP layer is the
//! only place that maps error kinds to status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ingestion::pdf::PdfError;
use crate::providers::{CompletionError, EmbeddingError};
use crate::vector::VectorIndexError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream call timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("{0}")]
    Generation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Generation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({status}): {self}");
        } else {
            tracing::debug!("Request rejected ({status}): {self}");
        }
        // One-line messages only; provider bodies and stack traces never
        // reach the client.
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidPdf(_) | PdfError::EmptyDocument { .. } => {
                AppError::BadInput(err.to_string())
            }
        }
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Timeout => AppError::UpstreamTimeout("embedding model".to_string()),
            other => AppError::Upstream(format!("embedding model: {other}")),
        }
    }
}

impl From<CompletionError> for AppError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Timeout => AppError::UpstreamTimeout("completion model".to_string()),
            other => AppError::Upstream(format!("completion model: {other}")),
        }
    }
}

impl From<VectorIndexError> for AppError {
    fn from(err: VectorIndexError) -> Self {
        match err {
            VectorIndexError::Timeout => AppError::UpstreamTimeout("vector index".to_string()),
            other => AppError::Upstream(format!("vector index: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::UpstreamTimeout("x".into()).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Upstream("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Generation("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_timeout_errors_map_to_504() {
        let err: AppError = EmbeddingError::Timeout.into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        let err: AppError = CompletionError::Timeout.into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        let err: AppError = VectorIndexError::Timeout.into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
