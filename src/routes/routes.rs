//! Defines routes for the recipe API.
//!
//! ## Structure
//! - **Users**
//!   - `POST   /users` — register, returns a bearer token
//!
//! - **Recipes** (writes require `Authorization: Bearer <token>`)
//!   - `POST   /recipes` — create
//!   - `GET    /recipes` — list all
//!   - `GET    /recipes/{id}` — fetch one
//!   - `PUT    /recipes/{id}` — update name / ingredients / preparation
//!   - `DELETE /recipes/{id}` — delete
//!   - `PUT    /recipes/{id}/image` — upload image (multipart field `image`)
//!
//! - **Images**
//!   - `GET    /images/{file}` — stored recipe images

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        recipe_handlers::{
            create_recipe, delete_recipe, get_all_recipes, get_image, get_recipe, update_recipe,
            update_recipe_image,
        },
        user_handlers::create_user,
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

/// Build the route table. State is supplied by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/users", post(create_user))
        .route("/recipes", post(create_recipe).get(get_all_recipes))
        .route(
            "/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/{id}/image", put(update_recipe_image))
        .route("/images/{file}", get(get_image))
}

/// The full application: routes, request tracing and shared state.
pub fn app(state: AppState) -> Router {
    routes().layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "recipe-test-boundary";

    struct TestApp {
        router: Router,
        _uploads: TempDir,
    }

    impl TestApp {
        async fn new() -> Self {
            let uploads = TempDir::new().unwrap();
            let state = AppState::new(test_pool().await, uploads.path());
            Self {
                router: app(state),
                _uploads: uploads,
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
            let (status, bytes) = self.send(request).await;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }

        async fn register(&self) -> String {
            let (status, body) = self
                .send_json(json_request(
                    "POST",
                    "/users",
                    None,
                    json!({ "name": "Erick", "email": "erick@example.com" }),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["token"].as_str().unwrap().to_string()
        }

        async fn create_soup(&self, token: &str) -> Value {
            let (status, body) = self
                .send_json(json_request(
                    "POST",
                    "/recipes",
                    Some(token),
                    json!({ "name": "Soup", "ingredients": "Water, salt", "preparation": "Boil" }),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["recipe"].clone()
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn image_request(uri: &str, token: &str, field: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"soup.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_201_with_wrapped_recipe() {
        let app = TestApp::new().await;
        let token = app.register().await;

        let recipe = app.create_soup(&token).await;

        assert_eq!(recipe["name"], "Soup");
        assert_eq!(recipe["ingredients"], "Water, salt");
        assert_eq!(recipe["preparation"], "Boil");
        assert_eq!(recipe["_id"].as_str().unwrap().len(), 24);
        assert!(recipe["userId"].is_string());
        assert!(recipe.get("image").is_none());
    }

    #[tokio::test]
    async fn create_with_invalid_entries_is_400() {
        let app = TestApp::new().await;
        let token = app.register().await;

        let bodies = [
            json!({ "name": "", "ingredients": "x", "preparation": "y" }),
            json!({ "ingredients": "x", "preparation": "y" }),
            json!({ "name": 42, "ingredients": "x", "preparation": "y" }),
            json!("not an object"),
        ];
        for body in bodies {
            let (status, body) = app
                .send_json(json_request("POST", "/recipes", Some(&token), body))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "message": "Invalid entries. Try again." }));
        }

        let (_, list) = app.send_json(empty_request("GET", "/recipes", None)).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn writes_require_a_known_token() {
        let app = TestApp::new().await;
        let body = json!({ "name": "Soup", "ingredients": "x", "preparation": "y" });

        let (status, body_out) = app
            .send_json(json_request("POST", "/recipes", None, body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body_out, json!({ "message": "missing auth token" }));

        let (status, body_out) = app
            .send_json(json_request("POST", "/recipes", Some("bogus"), body))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body_out, json!({ "message": "invalid auth token" }));
    }

    #[tokio::test]
    async fn bare_token_header_is_accepted() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let id = created["_id"].as_str().unwrap();

        let (status, _) = app
            .send(empty_request("DELETE", &format!("/recipes/{id}"), Some(&token)))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn list_and_fetch() {
        let app = TestApp::new().await;
        let token = app.register().await;

        let (status, list) = app.send_json(empty_request("GET", "/recipes", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, json!([]));

        let first = app.create_soup(&token).await;
        app.create_soup(&token).await;

        let (_, list) = app.send_json(empty_request("GET", "/recipes", None)).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
        assert_eq!(list[0], first);

        let uri = format!("/recipes/{}", first["_id"].as_str().unwrap());
        let (status, fetched) = app.send_json(empty_request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, first);
    }

    #[tokio::test]
    async fn malformed_id_is_404() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let not_found = json!({ "message": "recipe not found" });

        let (status, body) = app
            .send_json(empty_request("GET", "/recipes/not-a-valid-id", None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);

        let (status, body) = app
            .send_json(json_request(
                "PUT",
                "/recipes/not-a-valid-id",
                Some(&token),
                json!({ "name": "Stew" }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);

        let (status, body) = app
            .send_json(empty_request(
                "DELETE",
                "/recipes/not-a-valid-id",
                Some(&format!("Bearer {token}")),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);

        let (status, body) = app
            .send_json(image_request(
                "/recipes/not-a-valid-id/image",
                &token,
                "image",
                b"jpeg",
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);
    }

    #[tokio::test]
    async fn update_then_delete() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let uri = format!("/recipes/{}", created["_id"].as_str().unwrap());

        let (status, updated) = app
            .send_json(json_request(
                "PUT",
                &uri,
                Some(&token),
                json!({ "name": "Stew", "userId": "someone-else" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Stew");
        assert_eq!(updated["preparation"], "Boil");
        assert_eq!(updated["_id"], created["_id"]);
        assert_eq!(updated["userId"], created["userId"]);

        let (status, body) = app
            .send(empty_request("DELETE", &uri, Some(&format!("Bearer {token}"))))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = app.send_json(empty_request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn image_upload_and_download() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let id = created["_id"].as_str().unwrap();

        let (status, updated) = app
            .send_json(image_request(
                &format!("/recipes/{id}/image"),
                &token,
                "image",
                b"\xff\xd8\xffsoup",
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        let image = format!("/images/{id}.jpeg");
        assert_eq!(updated["image"], image.as_str());
        assert_eq!(updated["name"], "Soup");

        let response = app
            .router
            .clone()
            .oneshot(empty_request("GET", &image, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\xff\xd8\xffsoup");
    }

    #[tokio::test]
    async fn image_upload_without_image_field_is_400() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let id = created["_id"].as_str().unwrap();

        let (status, body) = app
            .send_json(image_request(
                &format!("/recipes/{id}/image"),
                &token,
                "photo",
                b"jpeg",
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Invalid entries. Try again." }));
    }

    #[tokio::test]
    async fn unknown_image_is_404() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send_json(empty_request("GET", "/images/../../etc/passwd", None))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, Value::Null);

        let (status, body) = app
            .send_json(empty_request(
                "GET",
                "/images/5f43a7ca92d58904914656b6.jpeg",
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "image not found" }));
    }

    #[tokio::test]
    async fn duplicate_registration_is_409() {
        let app = TestApp::new().await;
        app.register().await;

        let (status, body) = app
            .send_json(json_request(
                "POST",
                "/users",
                None,
                json!({ "name": "Erick", "email": "erick@example.com" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "message": "Email already registered" }));
    }

    #[tokio::test]
    async fn health_endpoints() {
        let app = TestApp::new().await;

        let (status, body) = app.send_json(empty_request("GET", "/healthz", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let (status, body) = app.send_json(empty_request("GET", "/readyz", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["sqlite"]["ok"], true);
        assert_eq!(body["checks"]["uploads"]["ok"], true);
    }

    fn raw_request(
        method: &str,
        uri: &str,
        token: &str,
        content_type: &str,
        body: &str,
    ) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn image_upload_with_non_multipart_body() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let id = created["_id"].as_str().unwrap();

        let (status, body) = app
            .send_json(raw_request(
                "PUT",
                "/recipes/not-a-valid-id/image",
                &token,
                "application/json",
                r#"{"image": "x"}"#,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "recipe not found" }));

        let (status, body) = app
            .send_json(raw_request(
                "PUT",
                &format!("/recipes/{id}/image"),
                &token,
                "application/json",
                r#"{"image": "x"}"#,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Invalid entries. Try again." }));
    }

    #[tokio::test]
    async fn image_upload_with_truncated_multipart_body() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let multipart = format!("multipart/form-data; boundary={BOUNDARY}");
        let truncated = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=");

        let (status, body) = app
            .send_json(raw_request(
                "PUT",
                "/recipes/not-a-valid-id/image",
                &token,
                &multipart,
                &truncated,
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "recipe not found" }));

        let created = app.create_soup(&token).await;
        let (status, body) = app
            .send_json(raw_request(
                "PUT",
                &format!("/recipes/{}/image", created["_id"].as_str().unwrap()),
                &token,
                &multipart,
                &truncated,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Invalid entries. Try again." }));
    }

    #[tokio::test]
    async fn update_with_unreadable_body() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let uri = format!("/recipes/{}", created["_id"].as_str().unwrap());
        let invalid = json!({ "message": "Invalid entries. Try again." });

        let (status, body) = app
            .send_json(raw_request("PUT", &uri, &token, "application/json", "{not json"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);

        let (status, body) = app
            .send_json(json_request("PUT", &uri, Some(&token), json!({ "name": 5 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);

        let (status, body) = app
            .send_json(raw_request("PUT", &uri, &token, "text/plain", "Stew"))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, invalid);

        let (_, unchanged) = app.send_json(empty_request("GET", &uri, None)).await;
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn update_with_malformed_id_and_body_is_404() {
        let app = TestApp::new().await;
        let token = app.register().await;

        let (status, body) = app
            .send_json(raw_request(
                "PUT",
                "/recipes/not-a-valid-id",
                &token,
                "application/json",
                "{not json",
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "recipe not found" }));

        let (status, body) = app
            .send_json(json_request(
                "PUT",
                "/recipes/not-a-valid-id",
                Some(&token),
                json!({ "name": 5 }),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "recipe not found" }));
    }

    #[tokio::test]
    async fn lowercase_bearer_scheme_is_accepted() {
        let app = TestApp::new().await;
        let token = app.register().await;
        let created = app.create_soup(&token).await;
        let uri = format!("/recipes/{}", created["_id"].as_str().unwrap());

        let (status, _) = app
            .send(empty_request("DELETE", &uri, Some(&format!("bearer {token}"))))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
