use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::handlers::document_get::parse_document_id;
use crate::middleware::CollectionContext;
use crate::services::DocumentService;
use crate::state::AppState;

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    ctx: CollectionContext,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let id = parse_document_id(&id)?;
    DocumentService::new(&state).delete(&ctx, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
