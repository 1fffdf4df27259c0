//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub cache: String,
    pub cache_backend: &'static str,
}

fn describe<E: std::fmt::Display>(what: &str, result: Result<(), E>) -> String {
    match result {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "{what} health check failed");
            format!("error: {e}")
        }
    }
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: checks the document store and the page cache.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = describe("Document store", state.store.ping().await);
    let cache = describe("Page cache", state.cache.ping().await);
    let status = if database == "connected" && cache == "connected" {
        "ok"
    } else {
        "degraded"
    };

    ApiResponse::success(HealthStatus {
        status: status.to_string(),
        database,
        cache,
        cache_backend: state.cache.backend_name(),
    })
}
