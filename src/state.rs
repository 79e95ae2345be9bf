use crate::{
    models::{recipe::RecipesModel, user::UsersModel},
    services::{image_store::ImageStore, recipe_service::RecipeService, user_service::UserService},
};
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

/// Shared state handed to every handler. Handlers pull the piece they need
/// through `FromRef`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub uploads_dir: PathBuf,
    pub recipes: RecipeService,
    pub users: UserService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, uploads_dir: impl Into<PathBuf>) -> Self {
        let uploads_dir = uploads_dir.into();
        let recipes = RecipeService::new(
            RecipesModel::new(db.clone()),
            ImageStore::new(uploads_dir.clone()),
        );
        let users = UserService::new(UsersModel::new(db.clone()));
        Self {
            db,
            uploads_dir,
            recipes,
            users,
        }
    }
}
