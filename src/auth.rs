use crate::{errors::AppError, models::user::User, services::user_service::UserService};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

/// Extractor that resolves the `Authorization` header to a registered user.
///
/// Accepts `Bearer <token>` (scheme in any case) or the bare token.
/// Rejects with 401.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    UserService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let users = UserService::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthorized("missing auth token"))?;
        let raw = header_value
            .to_str()
            .map_err(|_| AppError::unauthorized("invalid auth token"))?;
        let token = bearer_token(raw);

        let user = users
            .authenticate(token)
            .await?
            .ok_or_else(|| AppError::unauthorized("invalid auth token"))?;

        Ok(AuthUser(user))
    }
}

/// Strip an optional `Bearer` scheme, matched case-insensitively.
fn bearer_token(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => raw,
    }
}
