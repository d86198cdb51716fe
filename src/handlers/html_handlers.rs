//! Browser-facing pages over the same gateway operations as the JSON API.
//!
//! Mutations answer with `303 See Other` back to the bucket page. Failed
//! backend deletes are logged and still redirect. Form posts carrying an
//! `Origin` header must come from the gateway's own host.

use crate::{
    errors::{AppError, HtmlError},
    handlers::{auth::CurrentUser, path::BucketId, upload::read_file_field},
    models::permission::Capability,
    services::gateway_service::GatewayError,
    state::AppState,
    views,
};
use axum::{
    Form,
    extract::{Multipart, State, multipart::MultipartRejection, rejection::FormRejection},
    http::{HeaderMap, header},
    response::{Html, Redirect},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub key: String,
}

fn bucket_page(bucket_id: i64) -> String {
    format!("/buckets/{}/", bucket_id)
}

/// Reject form posts whose `Origin` names a host other than this one.
///
/// Browsers attach `Origin` to cross-site form submissions, so a cookie
/// riding along on such a post is refused. Requests without the header
/// (API clients, tests) pass.
fn ensure_same_origin(headers: &HeaderMap) -> Result<(), AppError> {
    let Some(origin) = headers.get(header::ORIGIN) else {
        return Ok(());
    };
    let origin_host = origin
        .to_str()
        .ok()
        .and_then(|value| value.split_once("://"))
        .map(|(_, host)| host.trim_end_matches('/'));
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());

    match (origin_host, host) {
        (Some(origin_host), Some(host)) if origin_host.eq_ignore_ascii_case(host) => Ok(()),
        _ => {
            tracing::debug!("rejected cross-origin form post from {:?}", origin);
            Err(AppError::forbidden("Cross-origin form submission rejected."))
        }
    }
}

/// `GET /buckets/`
pub async fn bucket_index(
    user: Result<CurrentUser, AppError>,
    State(state): State<AppState>,
) -> Result<Html<String>, HtmlError> {
    let CurrentUser(user) = user?;
    let buckets = state.gateway.visible_buckets(&user).await?;
    Ok(Html(views::bucket_index(&user, &buckets)))
}

/// `GET /buckets/{bucket_id}/`
pub async fn object_listing(
    user: Result<CurrentUser, AppError>,
    State(state): State<AppState>,
    bucket_id: Result<BucketId, AppError>,
) -> Result<Html<String>, HtmlError> {
    let CurrentUser(user) = user?;
    let BucketId(bucket_id) = bucket_id?;
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::View)
        .await?;
    let keys = state.gateway.list_objects(&bucket).await?;
    let caps = state.gateway.capabilities(&user, bucket_id).await?;
    Ok(Html(views::object_listing(bucket.bucket(), caps, &keys)))
}

/// `POST /buckets/{bucket_id}/upload/`
pub async fn upload_object(
    user: Result<CurrentUser, AppError>,
    State(state): State<AppState>,
    bucket_id: Result<BucketId, AppError>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, HtmlError> {
    let CurrentUser(user) = user?;
    let BucketId(bucket_id) = bucket_id?;
    ensure_same_origin(&headers)?;
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::Upload)
        .await?;
    let upload = read_file_field(multipart).await?;
    state.gateway.upload_object(&bucket, upload).await?;
    Ok(Redirect::to(&bucket_page(bucket_id)))
}

/// `POST /buckets/{bucket_id}/delete/`
pub async fn delete_object(
    user: Result<CurrentUser, AppError>,
    State(state): State<AppState>,
    bucket_id: Result<BucketId, AppError>,
    headers: HeaderMap,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<Redirect, HtmlError> {
    let CurrentUser(user) = user?;
    let BucketId(bucket_id) = bucket_id?;
    ensure_same_origin(&headers)?;
    let bucket = state
        .gateway
        .authorize(&user, bucket_id, Capability::Delete)
        .await?;
    let Ok(Form(DeleteForm { key })) = form else {
        return Err(AppError::bad_request("No key provided").into());
    };

    match state.gateway.delete_object(&bucket, &key).await {
        Ok(()) => {}
        Err(GatewayError::Storage(err)) => {
            tracing::warn!(
                "ignoring failed delete of {} in bucket {}: {}",
                key,
                bucket.bucket().name,
                err
            );
        }
        Err(err) => return Err(err.into()),
    }
    Ok(Redirect::to(&bucket_page(bucket_id)))
}
