//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks DB connectivity and the uploads dir

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Liveness probe, always 200. Performs no I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Runs `SELECT 1` against SQLite.
/// 2. Writes, reads back and deletes a probe file in the uploads directory.
///
/// HTTP 200 when both pass, 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.db)
        .await
    {
        Ok(1) => CheckStatus::ok(),
        Ok(v) => CheckStatus::failed(format!("unexpected result: {}", v)),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };

    let uploads_check = check_uploads_dir(&state).await;
    let overall_ok = sqlite_check.ok && uploads_check.ok;

    let mut checks = HashMap::new();
    checks.insert("sqlite", sqlite_check);
    checks.insert("uploads", uploads_check);

    let body = ReadyResponse {
        status: if overall_ok { "ok" } else { "error" }.into(),
        checks,
    };
    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn check_uploads_dir(state: &AppState) -> CheckStatus {
    if let Err(e) = fs::create_dir_all(&state.uploads_dir).await {
        return CheckStatus::failed(format!("could not create uploads dir: {}", e));
    }
    let probe = state.uploads_dir.join(format!(".readyz-{}", Uuid::new_v4()));
    if let Err(e) = fs::write(&probe, b"readyz").await {
        return CheckStatus::failed(format!("could not write probe file: {}", e));
    }
    let read_back = fs::read(&probe).await;
    let removed = fs::remove_file(&probe).await;
    match (read_back, removed) {
        (Ok(bytes), Ok(())) if bytes == b"readyz" => CheckStatus::ok(),
        (Ok(bytes), Err(e)) if bytes == b"readyz" => CheckStatus {
            ok: true,
            error: Some(format!("could not remove probe file: {}", e)),
        },
        (Ok(_), _) => CheckStatus::failed("probe file content mismatch"),
        (Err(e), _) => CheckStatus::failed(format!("could not read probe file: {}", e)),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}
