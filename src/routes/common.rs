//! Operational endpoints mounted next to `/api`.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct Probe {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<&'static str>,
}

/// Liveness: the process answers.
async fn health() -> Json<Probe> {
    Json(Probe {
        status: "ok",
        backend: None,
    })
}

/// Readiness: the backend answers a ping. 503 otherwise.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Probe>) {
    match state.backend.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Probe {
                status: "ok",
                backend: Some("ok"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "backend not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Probe {
                    status: "degraded",
                    backend: Some("unavailable"),
                }),
            )
        }
    }
}

async fn version() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
