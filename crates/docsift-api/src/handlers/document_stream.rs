use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::HttpAppError;
use crate::middleware::CollectionContext;
use crate::services::DocumentService;
use crate::state::AppState;

/// `Content-Disposition` value with the filename reduced to safe characters.
fn content_disposition(display_name: &str) -> HeaderValue {
    let safe: String = display_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    HeaderValue::from_str(&format!("inline; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

/// Stream content stored in the relational backend.
pub async fn stream_document(
    State(state): State<Arc<AppState>>,
    ctx: CollectionContext,
    Path(storage_key): Path<String>,
) -> Result<Response, HttpAppError> {
    let blob = DocumentService::new(&state)
        .stream(&ctx, &storage_key)
        .await?;

    let content_type = HeaderValue::from_str(&blob.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&blob.display_name)),
        ],
        blob.content,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_sanitizes_name() {
        assert_eq!(
            content_disposition("report 2024.pdf"),
            "inline; filename=\"report 2024.pdf\""
        );
        assert_eq!(
            content_disposition("a\"b\r\nc\u{e9}.txt"),
            "inline; filename=\"a_b__c_.txt\""
        );
    }
}
