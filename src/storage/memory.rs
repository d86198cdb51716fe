//! In-process backend for development runs. Contents vanish on restart.

use super::{ObjectStore, StorageResult};
use crate::models::bucket::Bucket;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    /// (physical bucket name, key) -> body
    objects: RwLock<BTreeMap<(String, String), Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_keys(&self, bucket: &Bucket) -> StorageResult<Vec<String>> {
        let prefix = bucket.key_prefix();
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|(name, key)| *name == bucket.name && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &Bucket,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        self.objects
            .write()
            .await
            .insert((bucket.name.clone(), key.to_string()), body);
        Ok(())
    }

    async fn delete_object(&self, bucket: &Bucket, key: &str) -> StorageResult<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.name.clone(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buckets_sharing_a_store_are_isolated() {
        let store = MemoryStore::new();
        let photos = Bucket {
            id: 1,
            name: "photos".into(),
            region: "local".into(),
            prefix: None,
        };
        let logs = Bucket {
            id: 2,
            name: "logs".into(),
            ..photos.clone()
        };

        store
            .put_object(&photos, "cat.jpg", Bytes::from_static(b"meow"), None)
            .await
            .unwrap();
        assert_eq!(store.list_keys(&photos).await.unwrap(), vec!["cat.jpg"]);
        assert!(store.list_keys(&logs).await.unwrap().is_empty());
        assert_eq!(
            store.get("photos", "cat.jpg").await,
            Some(Bytes::from_static(b"meow"))
        );

        store.delete_object(&photos, "cat.jpg").await.unwrap();
        store.delete_object(&photos, "cat.jpg").await.unwrap();
        assert!(store.list_keys(&photos).await.unwrap().is_empty());
    }
}
