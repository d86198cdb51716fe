//! Composes access mediation with the object store.
//!
//! Both presentation layers (JSON API and HTML pages) go through this
//! service. Every storage call takes an [`AuthorizedBucket`] and re-checks
//! the capability it was cleared for.

use crate::{
    models::{
        bucket::Bucket,
        permission::{Capability, CapabilitySet},
        user::User,
    },
    services::access_service::{AccessError, AccessMediator, AuthorizedBucket},
    storage::{ObjectStore, StorageError},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A file received from a client, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Physical bucket name.
    pub bucket: String,
    pub key: String,
}

#[derive(Clone)]
pub struct GatewayService {
    mediator: AccessMediator,
    store: Arc<dyn ObjectStore>,
}

impl GatewayService {
    pub fn new(mediator: AccessMediator, store: Arc<dyn ObjectStore>) -> Self {
        Self { mediator, store }
    }

    pub async fn visible_buckets(&self, user: &User) -> GatewayResult<Vec<Bucket>> {
        Ok(self.mediator.viewable_buckets(user).await?)
    }

    pub async fn authorize(
        &self,
        user: &User,
        bucket_id: i64,
        capability: Capability,
    ) -> GatewayResult<AuthorizedBucket> {
        match self.mediator.authorize(user, bucket_id, capability).await {
            Ok(authorized) => Ok(authorized),
            Err(err) => {
                debug!("denied {} on bucket {}: {}", user.username, bucket_id, err);
                Err(err.into())
            }
        }
    }

    pub async fn capabilities(&self, user: &User, bucket_id: i64) -> GatewayResult<CapabilitySet> {
        Ok(self.mediator.capabilities(user, bucket_id).await?)
    }

    pub async fn list_objects(&self, authorized: &AuthorizedBucket) -> GatewayResult<Vec<String>> {
        let bucket = require(authorized, Capability::View)?;
        Ok(self.store.list_keys(bucket).await?)
    }

    pub async fn upload_object(
        &self,
        authorized: &AuthorizedBucket,
        upload: PendingUpload,
    ) -> GatewayResult<UploadReceipt> {
        let bucket = require(authorized, Capability::Upload)?;
        let key = object_key(bucket.key_prefix(), &upload.filename, Utc::now());

        self.store
            .put_object(bucket, &key, upload.data, upload.content_type.as_deref())
            .await?;

        info!("uploaded {} to bucket {}", key, bucket.name);
        Ok(UploadReceipt {
            bucket: bucket.name.clone(),
            key,
        })
    }

    /// Delete `key` as given. The bucket prefix is not re-applied.
    pub async fn delete_object(&self, authorized: &AuthorizedBucket, key: &str) -> GatewayResult<()> {
        let bucket = require(authorized, Capability::Delete)?;
        self.store.delete_object(bucket, key).await?;
        info!("deleted {} from bucket {}", key, bucket.name);
        Ok(())
    }
}

fn require(authorized: &AuthorizedBucket, capability: Capability) -> Result<&Bucket, AccessError> {
    let bucket = authorized.bucket();
    if authorized.capability() != capability {
        return Err(AccessError::Forbidden {
            user_id: authorized.user_id(),
            bucket_id: bucket.id,
            capability,
        });
    }
    Ok(bucket)
}

/// Build the storage key for an upload:
/// `{prefix}{YYYYmmdd-HHMMSS-micros}_{filename}`.
///
/// Only the final path component of the client-supplied name is kept.
pub fn object_key(prefix: &str, filename: &str, at: DateTime<Utc>) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("upload");
    format!("{}{}_{}", prefix, at.format("%Y%m%d-%H%M%S-%6f"), name)
}
