use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{store::StoreError, validation::FieldErrors};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed query parameter or rejected body; reported per field.
    #[error("invalid input: {0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            },
            AppError::Persistence(err) => {
                tracing::error!(error = %err, "failed to persist movies");
                internal_error()
            },
            AppError::Task(err) => {
                tracing::error!(error = %err, "store task failed");
                internal_error()
            },
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal server error" })))
        .into_response()
}

pub type AppResult<T> = Result<T, AppError>;
