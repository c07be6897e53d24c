//! Caller identity resolved upstream and forwarded as headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use docsift_core::AppError;

use crate::error::HttpAppError;

pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const COLLECTION_ID_HEADER: &str = "x-collection-id";

const MAX_ID_LEN: usize = 128;

fn header_id(parts: &Parts, name: &str) -> Result<Option<String>, HttpAppError> {
    let Some(value) = parts.headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("{} header is not valid ASCII", name)))?
        .trim();

    if value.is_empty() {
        return Ok(None);
    }
    if value.len() > MAX_ID_LEN || !value.chars().all(|c| c.is_ascii_graphic()) {
        return Err(AppError::Unauthorized(format!("{} header is malformed", name)).into());
    }
    Ok(Some(value.to_string()))
}

fn required_id(parts: &Parts, name: &str) -> Result<String, HttpAppError> {
    header_id(parts, name)?
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)).into())
}

/// The caller, identified by `X-Owner-Id`. Used as the rate limit identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub owner_id: String,
}

impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CallerContext {
            owner_id: required_id(parts, OWNER_ID_HEADER)?,
        })
    }
}

/// Caller plus the collection it is acting on (`X-Collection-Id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionContext {
    pub owner_id: String,
    pub collection_id: String,
}

impl<S> FromRequestParts<S> for CollectionContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CollectionContext {
            owner_id: required_id(parts, OWNER_ID_HEADER)?,
            collection_id: required_id(parts, COLLECTION_ID_HEADER)?,
        })
    }
}
