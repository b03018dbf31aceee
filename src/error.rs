use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::token::TokenError;

/// Failures raised by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// AppError
///
/// The error taxonomy every handler and extractor returns. Rendered as
/// `{"message": ...}` with the status below.
///
/// | Variant | Status |
/// |---|---|
/// | `BadRequest`, `InvalidArgument` | 400 |
/// | `Unauthorized`, `Forbidden` | 401 |
/// | `Store`, `Token` | 500 |
///
/// Invalid tokens (`Forbidden`) also answer 401, never 403.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid identifier: {0}")]
    InvalidArgument(String),
    #[error("unauthorized access")]
    Unauthorized,
    #[error("forbidden access")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::Forbidden => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the logs. The surrounding request span
        // already carries method, uri and request id.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
