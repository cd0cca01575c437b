use askdb_context::MemoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ConversationNotFound(_) | ApiError::Memory(MemoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BadRequest(_) | ApiError::Memory(MemoryError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Memory(MemoryError::Turn { ref source }) => {
                tracing::error!(error = %source, "Turn failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "could not process your question".to_string(),
                )
            }
            ApiError::Memory(MemoryError::StorageUnavailable(ref e)) => {
                tracing::error!(error = %e, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Memory(ref e) => {
                tracing::error!(error = %e, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
