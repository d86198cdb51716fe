//! Multipart extraction shared by both upload routes.

use crate::{errors::AppError, services::gateway_service::PendingUpload};
use axum::extract::{
    Multipart,
    multipart::{MultipartError, MultipartRejection},
};

pub const NO_FILE_MESSAGE: &str = "No file provided";

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}

/// Read the `file` field of a multipart body.
///
/// A request that is not multipart at all, or whose `file` field is missing
/// or has no file name, counts as "no file".
pub async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PendingUpload, AppError> {
    let Ok(mut multipart) = multipart else {
        return Err(AppError::bad_request(NO_FILE_MESSAGE));
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned)
        else {
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok(PendingUpload {
            filename,
            content_type,
            data,
        });
    }

    Err(AppError::bad_request(NO_FILE_MESSAGE))
}
