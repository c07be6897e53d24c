use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use docsift_core::models::Document;
use docsift_core::StorageBackend;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::CollectionContext;
use crate::services::DocumentService;
use crate::state::AppState;

/// Listing entry; inline content is left out, fetch it through `GET /documents/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    pub display_name: String,
    pub content_type: String,
    pub byte_size: u64,
    pub backend: StorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_fallback: Option<bool>,
}

impl From<Document> for DocumentSummary {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            display_name: document.display_name,
            content_type: document.content_type,
            byte_size: document.byte_size,
            backend: document.backend,
            storage_key: document.storage_key,
            created_at: document.created_at,
            description: document.description,
            summary: document.summary,
            analysis_fallback: document.analysis_fallback,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub documents: Vec<DocumentSummary>,
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    ctx: CollectionContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let documents = DocumentService::new(&state).list(&ctx).await?;

    Ok(Json(ListResponse {
        documents: documents.into_iter().map(DocumentSummary::from).collect(),
    }))
}
