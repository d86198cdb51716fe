//! Path parameters shared by the bucket routes.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;

/// The `{bucket_id}` path segment.
///
/// A segment that is not an `i64` names no bucket, so it is rejected with the
/// same 404 as an unknown id.
#[derive(Debug, Clone, Copy)]
pub struct BucketId(pub i64);

impl<S> FromRequestParts<S> for BucketId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found())?;
        params
            .get("bucket_id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(BucketId)
            .ok_or_else(AppError::not_found)
    }
}

/// The `{key}` path segment of the JSON delete route, percent-decoded.
#[derive(Debug, Clone)]
pub struct ObjectKey(pub String);

impl<S> FromRequestParts<S> for ObjectKey
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(mut params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        params
            .remove("key")
            .map(ObjectKey)
            .ok_or_else(AppError::not_found)
    }
}
