//! Health check handler and response types.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub storage: StorageHealth,
    pub key_value_store: KeyValueHealth,
    pub analysis: AnalysisHealth,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StorageHealth {
    pub backend: String,
    pub status: String,
    pub config: Value,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct KeyValueHealth {
    pub backend: String,
    pub status: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AnalysisHealth {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub daily_limit: u32,
}

/// Liveness plus storage backend, masked storage configuration and the
/// key/value store status.
pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage_status = match state.storage.resolve().await {
        Ok(storage) if storage.is_configured() => "healthy".to_string(),
        Ok(_) => "not_configured".to_string(),
        Err(e) => format!("unhealthy: {}", e),
    };
    let kv_status = run_check(CHECK_TIMEOUT, state.kv.ping(), "unhealthy").await;

    let healthy = storage_status == "healthy" && kv_status == "healthy";
    if !healthy {
        tracing::warn!(storage = %storage_status, kv = %kv_status, "Health check degraded");
    }

    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        storage: StorageHealth {
            backend: state.storage.backend().to_string(),
            status: storage_status,
            config: state.storage.masked_config(),
        },
        key_value_store: KeyValueHealth {
            backend: state.kv.backend_name().to_string(),
            status: kv_status,
        },
        analysis: AnalysisHealth {
            enabled: state.analysis.enabled(),
            model: state.analysis.model.clone(),
            daily_limit: state.analysis.orchestrator.daily_limit(),
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
