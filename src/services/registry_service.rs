//! Administrative writes to the bucket registry and permission store.
//!
//! The gateway itself only reads these tables (see `access_service`); this
//! service backs the admin commands.

use crate::models::{
    bucket::Bucket,
    permission::{CapabilitySet, PermissionGrant},
};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

/// A grant joined with the names it refers to, for display.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrantSummary {
    pub id: i64,
    pub username: String,
    pub bucket_id: i64,
    pub bucket_name: String,
    pub can_view: bool,
    pub can_upload: bool,
    pub can_delete: bool,
}

#[derive(Clone)]
pub struct RegistryService {
    db: Arc<SqlitePool>,
}

impl RegistryService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Register a bucket. An empty prefix is stored as NULL.
    pub async fn create_bucket(
        &self,
        name: &str,
        region: &str,
        prefix: Option<&str>,
    ) -> Result<Bucket, sqlx::Error> {
        let prefix = prefix.filter(|p| !p.is_empty());
        sqlx::query_as::<_, Bucket>(
            "INSERT INTO buckets (name, region, prefix) VALUES (?, ?, ?)
             RETURNING id, name, region, prefix",
        )
        .bind(name)
        .bind(region)
        .bind(prefix)
        .fetch_one(&*self.db)
        .await
    }

    /// Append a grant row. Existing grants for the pair are left untouched.
    pub async fn grant(
        &self,
        user_id: i64,
        bucket_id: i64,
        caps: CapabilitySet,
    ) -> Result<PermissionGrant, sqlx::Error> {
        sqlx::query_as::<_, PermissionGrant>(
            "INSERT INTO bucket_permissions (user_id, bucket_id, can_view, can_upload, can_delete)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, user_id, bucket_id, can_view, can_upload, can_delete",
        )
        .bind(user_id)
        .bind(bucket_id)
        .bind(caps.view)
        .bind(caps.upload)
        .bind(caps.delete)
        .fetch_one(&*self.db)
        .await
    }

    pub async fn list_grants(
        &self,
        username: Option<&str>,
    ) -> Result<Vec<GrantSummary>, sqlx::Error> {
        sqlx::query_as::<_, GrantSummary>(
            "SELECT p.id, u.username, b.id AS bucket_id, b.name AS bucket_name,
                    p.can_view, p.can_upload, p.can_delete
             FROM bucket_permissions p
             JOIN users u ON u.id = p.user_id
             JOIN buckets b ON b.id = p.bucket_id
             WHERE ?1 IS NULL OR u.username = ?1
             ORDER BY u.username, b.id, p.id",
        )
        .bind(username)
        .fetch_all(&*self.db)
        .await
    }
}
