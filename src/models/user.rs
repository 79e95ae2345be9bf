//! Registered users, the owners referenced by `Recipe::user_id`.

use bson::oid::ObjectId;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

pub const DEFAULT_ROLE: &str = "user";

#[derive(Clone)]
pub struct UsersModel {
    db: Arc<SqlitePool>,
}

impl UsersModel {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        token: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, role, token)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, name, email, role",
        )
        .bind(ObjectId::new().to_hex())
        .bind(name)
        .bind(email)
        .bind(DEFAULT_ROLE)
        .bind(token)
        .fetch_one(&*self.db)
        .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE token = ?")
            .bind(token)
            .fetch_optional(&*self.db)
            .await
    }
}
