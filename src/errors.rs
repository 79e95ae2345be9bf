use crate::services::{recipe_service::RecipeError, user_service::UserError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Error returned by every handler. The body carries only the message.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error. The cause is logged, never
    /// sent to the client.
    pub fn internal(cause: impl fmt::Display) -> Self {
        tracing::error!("request failed: {}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        let status = match err {
            RecipeError::InvalidEntries => StatusCode::BAD_REQUEST,
            RecipeError::NotFound | RecipeError::ImageNotFound => StatusCode::NOT_FOUND,
            RecipeError::Sqlx(e) => return AppError::internal(e),
            RecipeError::Io(e) => return AppError::internal(e),
        };
        AppError::new(status, err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        let status = match err {
            UserError::InvalidEntries => StatusCode::BAD_REQUEST,
            UserError::EmailTaken => StatusCode::CONFLICT,
            UserError::Sqlx(e) => return AppError::internal(e),
        };
        AppError::new(status, err.to_string())
    }
}
