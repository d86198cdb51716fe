//! AWS S3 backend.
//!
//! Credentials and endpoint come from the standard AWS provider chain
//! (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, profiles, ...). The region
//! is taken per request from the registered bucket.

use super::{ObjectStore, StorageError, StorageResult};
use crate::models::bucket::Bucket;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::{Client, config::Region, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::debug;

#[derive(Clone)]
pub struct S3Store {
    config: SdkConfig,
}

impl S3Store {
    pub fn new(config: SdkConfig) -> Self {
        Self { config }
    }

    /// Load shared configuration from the process environment.
    pub async fn from_env() -> Self {
        Self::new(aws_config::defaults(BehaviorVersion::latest()).load().await)
    }

    /// Client bound to the bucket's region. Clients share the underlying
    /// HTTP connector, so building one per call is cheap.
    fn client_for(&self, bucket: &Bucket) -> Client {
        let mut builder = aws_sdk_s3::config::Builder::from(&self.config);
        if !bucket.region.is_empty() {
            builder = builder.region(Region::new(bucket.region.clone()));
        }
        Client::from_conf(builder.build())
    }
}

fn backend_error<E>(err: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Backend(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_keys(&self, bucket: &Bucket) -> StorageResult<Vec<String>> {
        let client = self.client_for(bucket);
        let mut pages = client
            .list_objects_v2()
            .bucket(&bucket.name)
            .prefix(bucket.key_prefix())
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(backend_error)?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_owned)),
            );
        }
        debug!("listed {} keys in s3://{}", keys.len(), bucket.name);
        Ok(keys)
    }

    async fn put_object(
        &self,
        bucket: &Bucket,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        self.client_for(bucket)
            .put_object()
            .bucket(&bucket.name)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_owned))
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &Bucket, key: &str) -> StorageResult<()> {
        self.client_for(bucket)
            .delete_object()
            .bucket(&bucket.name)
            .key(key)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
