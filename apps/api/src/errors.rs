use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::game_data::GameDataError;
use crate::sheet::SheetError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Game data error: {0}")]
    GameData(GameDataError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GameDataError> for AppError {
    fn from(err: GameDataError) -> Self {
        match err {
            GameDataError::NotFound { .. } => AppError::NotFound(err.to_string()),
            GameDataError::UnknownCategory(_) | GameDataError::InvalidSlug(_) => {
                AppError::Validation(err.to_string())
            }
            other => AppError::GameData(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "The character backend could not complete the request".to_string(),
                )
            }
            AppError::GameData(e) => {
                tracing::error!("Game data error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GAME_DATA_ERROR",
                    "The reference data service could not complete the request".to_string(),
                )
            }
            AppError::Sheet(e) => {
                tracing::error!("Sheet error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SHEET_ERROR",
                    "The character sheet could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
