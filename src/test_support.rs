//! Shared fixtures for unit tests.

use crate::{
    db,
    models::{bucket::Bucket, permission::CapabilitySet, user::User},
    services::{registry_service::RegistryService, user_service::UserService},
    storage::{MemoryStore, ObjectStore, StorageError, StorageResult},
};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// A migrated in-memory database. One connection, so every query sees the
/// same database.
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

pub fn caps(view: bool, upload: bool, delete: bool) -> CapabilitySet {
    CapabilitySet {
        view,
        upload,
        delete,
    }
}

pub async fn seed_user(db: &SqlitePool, username: &str) -> User {
    UserService::new(Arc::new(db.clone()))
        .create_user(username)
        .await
        .unwrap()
}

pub async fn seed_token(db: &SqlitePool, user: &User) -> String {
    UserService::new(Arc::new(db.clone()))
        .issue_token(user.id)
        .await
        .unwrap()
}

pub async fn seed_bucket(db: &SqlitePool, name: &str, prefix: Option<&str>) -> Bucket {
    RegistryService::new(Arc::new(db.clone()))
        .create_bucket(name, "us-east-1", prefix)
        .await
        .unwrap()
}

pub async fn seed_grant(db: &SqlitePool, user: &User, bucket: &Bucket, flags: CapabilitySet) {
    RegistryService::new(Arc::new(db.clone()))
        .grant(user.id, bucket.id, flags)
        .await
        .unwrap();
}

/// Memory-backed store that counts calls and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl RecordingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a backend error carrying `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub async fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.inner.get(bucket, key).await
    }

    fn record(&self) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(StorageError::Backend(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn list_keys(&self, bucket: &Bucket) -> StorageResult<Vec<String>> {
        self.record()?;
        self.inner.list_keys(bucket).await
    }

    async fn put_object(
        &self,
        bucket: &Bucket,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<()> {
        self.record()?;
        self.inner.put_object(bucket, key, body, content_type).await
    }

    async fn delete_object(&self, bucket: &Bucket, key: &str) -> StorageResult<()> {
        self.record()?;
        self.inner.delete_object(bucket, key).await
    }
}

/// Store whose every call stalls for `delay` before succeeding.
pub struct SlowStore {
    pub delay: Duration,
}

#[async_trait]
impl ObjectStore for SlowStore {
    async fn list_keys(&self, _bucket: &Bucket) -> StorageResult<Vec<String>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn put_object(
        &self,
        _bucket: &Bucket,
        _key: &str,
        _body: Bytes,
        _content_type: Option<&str>,
    ) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn delete_object(&self, _bucket: &Bucket, _key: &str) -> StorageResult<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
