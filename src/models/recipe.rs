//! Recipe documents and the queries that read and write them.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

/// A stored recipe.
///
/// Serialized with the document-store field names (`_id`, `userId`) so clients
/// see the same shape regardless of the backing table layout.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Recipe {
    /// 24-character hex object id, assigned at creation.
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    /// Free text, not a structured list.
    pub ingredients: String,

    pub preparation: String,

    /// Owner, taken from the authenticated caller at creation.
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Image URL or path, only present once set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Partial update of the text fields. `None` keeps the stored value.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub preparation: Option<String>,
}

const RECIPE_COLUMNS: &str = "id, name, ingredients, preparation, user_id, image";

/// The only component that touches the `recipes` table.
#[derive(Clone)]
pub struct RecipesModel {
    db: Arc<SqlitePool>,
}

impl RecipesModel {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a recipe under a freshly generated id and return the stored row.
    pub async fn create_recipe(
        &self,
        name: &str,
        ingredients: &str,
        preparation: &str,
        user_id: &str,
    ) -> Result<Recipe, sqlx::Error> {
        let id = ObjectId::new();
        sqlx::query_as::<_, Recipe>(&format!(
            "INSERT INTO recipes (id, name, ingredients, preparation, user_id)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id.to_hex())
        .bind(name)
        .bind(ingredients)
        .bind(preparation)
        .bind(user_id)
        .fetch_one(&*self.db)
        .await
    }

    /// Every recipe, in insertion order.
    pub async fn get_all_recipes(&self) -> Result<Vec<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY rowid ASC"
        ))
        .fetch_all(&*self.db)
        .await
    }

    pub async fn get_recipe_by_id(&self, id: &ObjectId) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?"
        ))
        .bind(id.to_hex())
        .fetch_optional(&*self.db)
        .await
    }

    /// Apply `changes` in place. `id` and `user_id` are never written.
    pub async fn update_recipe(
        &self,
        id: &ObjectId,
        changes: &RecipeChanges,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes SET
                name = COALESCE(?, name),
                ingredients = COALESCE(?, ingredients),
                preparation = COALESCE(?, preparation)
             WHERE id = ?
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(changes.name.as_deref())
        .bind(changes.ingredients.as_deref())
        .bind(changes.preparation.as_deref())
        .bind(id.to_hex())
        .fetch_optional(&*self.db)
        .await
    }

    /// Remove the row, returning what was deleted.
    pub async fn delete_recipe(&self, id: &ObjectId) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "DELETE FROM recipes WHERE id = ? RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(id.to_hex())
        .fetch_optional(&*self.db)
        .await
    }

    pub async fn update_recipe_image(
        &self,
        id: &ObjectId,
        image: &str,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            "UPDATE recipes SET image = ? WHERE id = ? RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(image)
        .bind(id.to_hex())
        .fetch_optional(&*self.db)
        .await
    }
}
