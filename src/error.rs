use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
///
/// Only `SessionExpired`, `UnknownQuestion` and `InvalidInput` are expected
/// request failures; search, enrichment and analytics catch their own
/// upstream errors and degrade instead of surfacing them.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Session expired or not found: {0}")]
    SessionExpired(String),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Concurrent session update: {0}")]
    Conflict(String),

    #[error("Session store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for clients (the UI restarts the flow
    /// on `session_expired`)
    pub fn code(&self) -> &'static str {
        match self {
            AppError::SessionExpired(_) => "session_expired",
            AppError::UnknownQuestion(_) => "unknown_question",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Conflict(_) => "conflict",
            AppError::Store(_) => "store_error",
            AppError::HttpClient(_) => "upstream_error",
            AppError::ExternalApi(_) => "upstream_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::SessionExpired(msg) => (StatusCode::GONE, msg.clone()),
            AppError::UnknownQuestion(msg) | AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Store(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
