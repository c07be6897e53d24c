use axum::{extract::State, response::IntoResponse, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use docsift_core::models::AnalysisRequest;
use docsift_core::AppError;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{decision_headers, HttpAppError, ValidatedJson};
use crate::middleware::CallerContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub content_base64: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub display_name: String,
}

/// Analyze content without storing it.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    caller: CallerContext,
    ValidatedJson(body): ValidatedJson<AnalyzeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let content = STANDARD
        .decode(body.content_base64.trim())
        .map_err(|e| AppError::InvalidInput(format!("contentBase64 is not valid base64: {}", e)))?;

    if content.is_empty() {
        return Err(AppError::InvalidInput("contentBase64 is empty".to_string()).into());
    }
    let max_bytes = state.config.max_upload_size_bytes();
    if content.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Content exceeds maximum allowed size of {} MB",
            max_bytes / 1024 / 1024
        ))
        .into());
    }

    let request = AnalysisRequest::new(content, body.content_type, body.display_name);
    let outcome = state
        .analysis
        .orchestrator
        .analyze(&caller.owner_id, &request)
        .await?;

    Ok((decision_headers(&outcome.quota), Json(outcome.result)))
}
