//! JSON API over the gateway.
//!
//! - `GET /api/buckets/`: buckets the caller can view
//! - `GET /api/buckets/{bucket_id}/objects/`: keys under the bucket prefix
//! - `POST /api/buckets/{bucket_id}/upload/`: multipart upload, field `file`
//! - `DELETE /api/buckets/{bucket_id}/objects/{key}/`: delete `key` verbatim
//!
//! Keys containing `/` must be percent-encoded in the delete path. A
//! `bucket_id` that is not an integer is answered like an unknown bucket.

use crate::{
    errors::AppError,
    handlers::{
        auth::CurrentUser,
        path::{BucketId, ObjectKey},
        upload::read_file_field,
    },
    models::{bucket::Bucket, permission::Capability},
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `GET /api/buckets/`
pub async fn list_buckets(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Bucket>>, AppError> {
    Ok(Json(state.gateway.visible_buckets(&user).await?))
}

/// `GET /api/buckets/{bucket_id}/objects/`
pub async fn list_objects(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    BucketId(bucket_id): BucketId,
) -> Result<Json<Vec<String>>, AppError> {
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::View)
        .await?;
    Ok(Json(state.gateway.list_objects(&bucket).await?))
}

/// `POST /api/buckets/{bucket_id}/upload/`
///
/// Authorization runs before the body is read, so a denied caller gets 404
/// even when no file was attached.
pub async fn upload_object(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    BucketId(bucket_id): BucketId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::Upload)
        .await?;
    let upload = read_file_field(multipart).await?;
    let receipt = state.gateway.upload_object(&bucket, upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Upload successful",
            bucket: receipt.bucket,
            key: receipt.key,
        }),
    ))
}

/// `DELETE /api/buckets/{bucket_id}/objects/{key}/`
pub async fn delete_object(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    BucketId(bucket_id): BucketId,
    ObjectKey(key): ObjectKey,
) -> Result<Json<MessageResponse>, AppError> {
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::Delete)
        .await?;
    state.gateway.delete_object(&bucket, &key).await?;
    Ok(Json(MessageResponse {
        message: "Deleted successfully",
    }))
}
