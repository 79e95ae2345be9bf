//! HTTP handlers for recipes and their images.
//! Each handler extracts its inputs, delegates to `RecipeService`, and turns
//! the result into a JSON response; failures go through `AppError`.

use crate::{
    auth::AuthUser,
    errors::AppError,
    models::recipe::{Recipe, RecipeChanges},
    services::recipe_service::{CreatedRecipe, RecipeError, RecipeService, validate_id},
};
use axum::{
    Json,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use futures::{StreamExt, stream};
use serde::Deserialize;
use serde_json::Value;
use std::io;
use tokio_util::io::ReaderStream;

/// Multipart field carrying the image in `PUT /recipes/{id}/image`.
const IMAGE_FIELD: &str = "image";

/// Body of `POST /recipes`. Fields stay untyped so a wrong type is reported
/// as invalid entries rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub ingredients: Option<Value>,
    #[serde(default)]
    pub preparation: Option<Value>,
}

fn text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

/// `POST /recipes`
pub async fn create_recipe(
    State(service): State<RecipeService>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedRecipe>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("rejected recipe body: {}", rejection);
        RecipeError::InvalidEntries
    })?;

    let created = service
        .create_recipe(
            text(&payload.name),
            text(&payload.ingredients),
            text(&payload.preparation),
            &user,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /recipes`
pub async fn get_all_recipes(
    State(service): State<RecipeService>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(service.get_all_recipes().await?))
}

/// `GET /recipes/{id}`
pub async fn get_recipe(
    State(service): State<RecipeService>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    Ok(Json(service.get_recipe_by_id(&id).await?))
}

/// `PUT /recipes/{id}` — partial update of the text fields.
pub async fn update_recipe(
    State(service): State<RecipeService>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<RecipeChanges>, JsonRejection>,
) -> Result<Json<Recipe>, AppError> {
    let changes = match payload {
        Ok(Json(changes)) => changes,
        Err(rejection) => {
            // A malformed id still reports 404 ahead of the body problem.
            validate_id(&id)?;
            tracing::debug!("rejected recipe update body: {}", rejection);
            return Err(RecipeError::InvalidEntries.into());
        }
    };

    Ok(Json(service.update_recipe(changes, &id).await?))
}

/// `DELETE /recipes/{id}`
pub async fn delete_recipe(
    State(service): State<RecipeService>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service.delete_recipe(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /recipes/{id}/image` — multipart upload with an `image` field.
pub async fn update_recipe_image(
    State(service): State<RecipeService>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<Recipe>, AppError> {
    let mut multipart = match payload {
        Ok(multipart) => multipart,
        Err(rejection) => {
            validate_id(&id)?;
            tracing::debug!("rejected image upload: {}", rejection);
            return Err(RecipeError::InvalidEntries.into());
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                validate_id(&id)?;
                tracing::debug!("malformed multipart body: {}", err);
                return Err(RecipeError::InvalidEntries.into());
            }
        };
        if field.name() == Some(IMAGE_FIELD) {
            let upload = field.map(|chunk| chunk.map_err(io::Error::other));
            return Ok(Json(service.attach_image(&id, Some(upload)).await?));
        }
    }

    let no_upload = None::<stream::Empty<io::Result<Bytes>>>;
    Ok(Json(service.attach_image(&id, no_upload).await?))
}

/// `GET /images/{file}` — stream a stored image.
pub async fn get_image(
    State(service): State<RecipeService>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let (file, len) = service.open_image(&file).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}
