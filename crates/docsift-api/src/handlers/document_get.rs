use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use docsift_core::{AppError, StorageBackend};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::middleware::CollectionContext;
use crate::services::{DocumentAccess, DocumentService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AccessResponse {
    #[serde(rename_all = "camelCase")]
    Url {
        url: String,
        /// Seconds until the URL expires.
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_in: Option<u64>,
        backend: StorageBackend,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        backend: StorageBackend,
        content_type: String,
        content: String,
    },
}

impl From<DocumentAccess> for AccessResponse {
    fn from(access: DocumentAccess) -> Self {
        match access {
            DocumentAccess::Url {
                url,
                expires_in,
                backend,
            } => AccessResponse::Url {
                url,
                expires_in: expires_in.map(|d| d.as_secs()),
                backend,
            },
            DocumentAccess::Inline {
                content_type,
                content,
            } => AccessResponse::Inline {
                backend: StorageBackend::Inline,
                content_type,
                content,
            },
        }
    }
}

pub(crate) fn parse_document_id(id: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::InvalidInput("Document id must be a UUID".to_string()).into())
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    ctx: CollectionContext,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_document_id(&id)?;
    let access = DocumentService::new(&state).access(&ctx, id).await?;

    Ok(Json(AccessResponse::from(access)))
}
