use crate::{
    errors::AppError,
    services::user_service::{RegisteredUser, UserError, UserService},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
}

/// `POST /users` — register a user and hand back its bearer token.
pub async fn create_user(
    State(service): State<UserService>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUser>), AppError> {
    let Json(payload) = payload.map_err(|_| UserError::InvalidEntries)?;
    let registered = service
        .create_user(
            payload.name.as_ref().and_then(Value::as_str),
            payload.email.as_ref().and_then(Value::as_str),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(registered)))
}
