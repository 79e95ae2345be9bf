//! User registration and bearer-token lookup for the `AuthUser` extractor.

use crate::models::user::{User, UsersModel};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid entries. Try again.")]
    InvalidEntries,
    #[error("Email already registered")]
    EmailTaken,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type UserResult<T> = Result<T, UserError>;

/// A new user plus the token to send as `Authorization: Bearer <token>`.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    users: UsersModel,
}

impl UserService {
    pub fn new(users: UsersModel) -> Self {
        Self { users }
    }

    pub async fn create_user(
        &self,
        name: Option<&str>,
        email: Option<&str>,
    ) -> UserResult<RegisteredUser> {
        let (name, email) = match (name, email) {
            (Some(n), Some(e)) if !n.is_empty() && e.contains('@') => (n, e),
            _ => return Err(UserError::InvalidEntries),
        };

        let token = Uuid::new_v4().simple().to_string();
        let user = match self.users.create_user(name, email, &token).await {
            Ok(user) => user,
            Err(err) if is_unique_violation(&err) => return Err(UserError::EmailTaken),
            Err(err) => return Err(UserError::Sqlx(err)),
        };
        info!(user_id = %user.id, "user registered");

        Ok(RegisteredUser { user, token })
    }

    /// Resolve a bearer token to its user, `None` when nobody holds it.
    pub async fn authenticate(&self, token: &str) -> UserResult<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.users.find_by_token(token).await?)
    }
}

/// Return true if SQLx error indicates a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
