//! Object storage backends.
//!
//! The gateway never talks to a storage SDK directly: handlers receive an
//! [`ObjectStore`] trait object constructed in `main` and threaded through
//! application state, so tests and local runs can substitute a backend.
//!
//! - [`S3Store`]: AWS S3 (or compatible) through `aws-sdk-s3`
//! - [`DiskStore`]: plain files under a local directory
//! - [`MemoryStore`]: process-local map, for development

pub mod disk;
pub mod memory;
pub mod s3;

use crate::models::bucket::Bucket;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidObjectKey(String),
    #[error("bucket name `{0}` cannot be mapped to storage")]
    InvalidBucketName(String),
    /// Failure reported by the remote storage service; carries its message.
    #[error("{0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// List/put/delete by key, scoped to a registered [`Bucket`].
///
/// Implementations address the physical container through `bucket.name`
/// and `bucket.region`. Keys are passed through verbatim: prefixing is the
/// caller's concern, except for listing which is always limited to
/// `bucket.key_prefix()`.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Keys under the bucket's prefix, in backend order.
    async fn list_keys(&self, bucket: &Bucket) -> StorageResult<Vec<String>>;

    /// Store `body` at `key`, replacing any existing object.
    async fn put_object(
        &self,
        bucket: &Bucket,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()>;

    /// Remove the object at `key`. Deleting a missing key is not an error.
    async fn delete_object(&self, bucket: &Bucket, key: &str) -> StorageResult<()>;
}

/// Reject keys that cannot be mapped safely onto a filesystem path.
///
/// Rejects empty or oversized keys, leading `/`, `..` segments, backslashes
/// and control bytes.
pub(crate) fn ensure_key_safe(key: &str) -> StorageResult<()> {
    let invalid = || StorageError::InvalidObjectKey(key.to_string());
    if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
        return Err(invalid());
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(invalid());
    }
    if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_keys() {
        assert!(ensure_key_safe("uploads/20260101-000000-000000_a.txt").is_ok());
    }

    #[test]
    fn rejects_traversal_and_control_bytes() {
        for key in ["", "/etc/passwd", "a/../b", "..", "a\\b", "bad\nkey"] {
            assert!(
                matches!(ensure_key_safe(key), Err(StorageError::InvalidObjectKey(_))),
                "{key:?} should be rejected"
            );
        }
        assert!(ensure_key_safe(&"k".repeat(MAX_OBJECT_KEY_LEN + 1)).is_err());
    }
}
