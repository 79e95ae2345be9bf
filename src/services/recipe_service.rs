//! RecipeService — input validation in front of `RecipesModel`.
//!
//! Every operation that addresses an existing recipe checks the id format
//! before any query runs, and text fields are checked before anything is
//! written.

use crate::{
    models::{
        recipe::{Recipe, RecipeChanges, RecipesModel},
        user::User,
    },
    services::image_store::ImageStore,
};
use bson::oid::ObjectId;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use std::io::{self, ErrorKind};
use thiserror::Error;
use tokio::fs::File;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Invalid entries. Try again.")]
    InvalidEntries,
    #[error("recipe not found")]
    NotFound,
    #[error("image not found")]
    ImageNotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type RecipeResult<T> = Result<T, RecipeError>;

/// Response of a successful create, serialized as `{"recipe": {...}}`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CreatedRecipe {
    pub recipe: Recipe,
}

/// Require all three text fields to be present and non-empty.
pub fn validate_recipe_input<'a>(
    name: Option<&'a str>,
    ingredients: Option<&'a str>,
    preparation: Option<&'a str>,
) -> RecipeResult<(&'a str, &'a str, &'a str)> {
    match (name, ingredients, preparation) {
        (Some(n), Some(i), Some(p)) if !n.is_empty() && !i.is_empty() && !p.is_empty() => {
            Ok((n, i, p))
        }
        _ => Err(RecipeError::InvalidEntries),
    }
}

/// Check that `id` is a well-formed object id (24 hex characters).
///
/// Format only: an id that parses may still match no recipe.
pub fn validate_id(id: &str) -> RecipeResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| RecipeError::NotFound)
}

#[derive(Clone)]
pub struct RecipeService {
    recipes: RecipesModel,
    images: ImageStore,
}

impl RecipeService {
    pub fn new(recipes: RecipesModel, images: ImageStore) -> Self {
        Self { recipes, images }
    }

    pub async fn create_recipe(
        &self,
        name: Option<&str>,
        ingredients: Option<&str>,
        preparation: Option<&str>,
        user: &User,
    ) -> RecipeResult<CreatedRecipe> {
        let (name, ingredients, preparation) =
            validate_recipe_input(name, ingredients, preparation)?;
        let recipe = self
            .recipes
            .create_recipe(name, ingredients, preparation, &user.id)
            .await?;
        info!(recipe_id = %recipe.id, user_id = %recipe.user_id, "recipe created");
        Ok(CreatedRecipe { recipe })
    }

    /// All recipes, unfiltered and unpaginated.
    pub async fn get_all_recipes(&self) -> RecipeResult<Vec<Recipe>> {
        Ok(self.recipes.get_all_recipes().await?)
    }

    pub async fn get_recipe_by_id(&self, id: &str) -> RecipeResult<Recipe> {
        let id = validate_id(id)?;
        self.recipes
            .get_recipe_by_id(&id)
            .await?
            .ok_or(RecipeError::NotFound)
    }

    /// Present fields must be non-empty; absent fields are left untouched.
    pub async fn update_recipe(&self, changes: RecipeChanges, id: &str) -> RecipeResult<Recipe> {
        let id = validate_id(id)?;
        let fields = [&changes.name, &changes.ingredients, &changes.preparation];
        if fields.iter().any(|f| f.as_deref() == Some("")) {
            return Err(RecipeError::InvalidEntries);
        }
        let recipe = self
            .recipes
            .update_recipe(&id, &changes)
            .await?
            .ok_or(RecipeError::NotFound)?;
        info!(recipe_id = %recipe.id, "recipe updated");
        Ok(recipe)
    }

    /// Delete the recipe and any image stored for it.
    pub async fn delete_recipe(&self, id: &str) -> RecipeResult<Recipe> {
        let id = validate_id(id)?;
        let recipe = self
            .recipes
            .delete_recipe(&id)
            .await?
            .ok_or(RecipeError::NotFound)?;
        if recipe.image.is_some() {
            self.images.remove(&id).await;
        }
        info!(recipe_id = %recipe.id, "recipe deleted");
        Ok(recipe)
    }

    pub async fn update_recipe_image(&self, id: &str, image: &str) -> RecipeResult<Recipe> {
        let id = validate_id(id)?;
        self.recipes
            .update_recipe_image(&id, image)
            .await?
            .ok_or(RecipeError::NotFound)
    }

    /// Store an uploaded image for the recipe and point `image` at it.
    ///
    /// `upload` is `None` when the request carried no image; that and an
    /// empty upload are invalid entries. The id and the recipe's existence
    /// are checked before anything touches the disk.
    pub async fn attach_image<S>(&self, id: &str, upload: Option<S>) -> RecipeResult<Recipe>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let oid = validate_id(id)?;
        if self.recipes.get_recipe_by_id(&oid).await?.is_none() {
            return Err(RecipeError::NotFound);
        }
        let upload = upload.ok_or(RecipeError::InvalidEntries)?;

        let written = self.images.save_stream(&oid, upload).await?;
        if written == 0 {
            return Err(RecipeError::InvalidEntries);
        }
        debug!(recipe_id = %oid, bytes = written, "image stored");

        match self
            .update_recipe_image(id, &ImageStore::public_path(&oid))
            .await
        {
            Err(RecipeError::NotFound) => {
                // Deleted while the upload was streaming.
                self.images.remove(&oid).await;
                Err(RecipeError::NotFound)
            }
            other => other,
        }
    }

    /// Open a stored image by its public file name.
    pub async fn open_image(&self, file_name: &str) -> RecipeResult<(File, u64)> {
        self.images.open(file_name).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                RecipeError::ImageNotFound
            } else {
                RecipeError::Io(err)
            }
        })
    }
}
