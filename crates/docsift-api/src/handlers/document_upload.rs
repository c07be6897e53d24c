use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use docsift_core::models::{AnalysisResult, Document};
use docsift_core::StorageBackend;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::CollectionContext;
use crate::services::DocumentService;
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Uuid,
    pub display_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub backend: StorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl From<Document> for UploadResponse {
    fn from(document: Document) -> Self {
        let analysis = match (document.description, document.summary) {
            (Some(description), Some(summary)) => Some(AnalysisResult {
                description,
                summary,
                is_fallback: document.analysis_fallback.unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            id: document.id,
            display_name: document.display_name,
            content_type: document.content_type,
            byte_size: document.byte_size,
            backend: document.backend,
            storage_key: document.storage_key,
            inline_content: document.inline_content,
            created_at: document.created_at,
            analysis,
        }
    }
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    ctx: CollectionContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = extract_multipart_file(multipart).await?;
    let document = DocumentService::new(&state).upload(&ctx, file).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(document))))
}
