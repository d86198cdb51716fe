//! Access mediation: decides whether a user may perform an operation on a
//! bucket before any storage call is made.
//!
//! Grants are folded into a [`CapabilitySet`] rather than probed for a
//! single matching row, so several divergent grant rows for the same
//! (user, bucket) pair behave as their union.

use crate::models::{
    bucket::Bucket,
    permission::{Capability, CapabilitySet, PermissionGrant},
    user::User,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("bucket {0} not found")]
    BucketNotFound(i64),
    #[error("user {user_id} has no `{capability}` grant on bucket {bucket_id}")]
    Forbidden {
        user_id: i64,
        bucket_id: i64,
        capability: Capability,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// A bucket the mediator has cleared for one specific capability.
///
/// Only [`AccessMediator::authorize`] constructs this, so holding one proves
/// the check ran.
#[derive(Debug, Clone)]
pub struct AuthorizedBucket {
    bucket: Bucket,
    capability: Capability,
    user_id: i64,
}

impl AuthorizedBucket {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

#[derive(Clone)]
pub struct AccessMediator {
    db: Arc<SqlitePool>,
}

impl AccessMediator {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn find_bucket(&self, bucket_id: i64) -> AccessResult<Option<Bucket>> {
        let bucket = sqlx::query_as::<_, Bucket>(
            "SELECT id, name, region, prefix FROM buckets WHERE id = ?",
        )
        .bind(bucket_id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(bucket)
    }

    /// Union of every grant `user` holds on `bucket_id`. Empty when none.
    pub async fn capabilities(&self, user: &User, bucket_id: i64) -> AccessResult<CapabilitySet> {
        let grants = sqlx::query_as::<_, PermissionGrant>(
            "SELECT id, user_id, bucket_id, can_view, can_upload, can_delete
             FROM bucket_permissions WHERE user_id = ? AND bucket_id = ?",
        )
        .bind(user.id)
        .bind(bucket_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(CapabilitySet::from_grants(&grants))
    }

    /// Resolve `bucket_id` and check that `user` holds `capability` on it.
    pub async fn authorize(
        &self,
        user: &User,
        bucket_id: i64,
        capability: Capability,
    ) -> AccessResult<AuthorizedBucket> {
        let bucket = self
            .find_bucket(bucket_id)
            .await?
            .ok_or(AccessError::BucketNotFound(bucket_id))?;

        let caps = self.capabilities(user, bucket_id).await?;
        if !caps.allows(capability) {
            return Err(AccessError::Forbidden {
                user_id: user.id,
                bucket_id,
                capability,
            });
        }

        Ok(AuthorizedBucket {
            bucket,
            capability,
            user_id: user.id,
        })
    }

    /// Buckets `user` may view, each listed once, ordered by id.
    pub async fn viewable_buckets(&self, user: &User) -> AccessResult<Vec<Bucket>> {
        let buckets = sqlx::query_as::<_, Bucket>(
            "SELECT DISTINCT b.id, b.name, b.region, b.prefix
             FROM buckets b
             JOIN bucket_permissions p ON p.bucket_id = b.id
             WHERE p.user_id = ? AND p.can_view = 1
             ORDER BY b.id",
        )
        .bind(user.id)
        .fetch_all(&*self.db)
        .await?;
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{caps, memory_pool, seed_bucket, seed_grant, seed_user};

    const ALL: [Capability; 3] = [Capability::View, Capability::Upload, Capability::Delete];

    #[tokio::test]
    async fn authorize_matches_grant_flags_exactly() {
        let db = Arc::new(memory_pool().await);
        let mediator = AccessMediator::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bucket = seed_bucket(&db, "media", None).await;

        // every combination of flags on a single grant row
        for mask in 0u8..8 {
            let flags = caps(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0);
            sqlx::query("DELETE FROM bucket_permissions")
                .execute(&*db)
                .await
                .unwrap();
            seed_grant(&db, &alice, &bucket, flags).await;

            for capability in ALL {
                let result = mediator.authorize(&alice, bucket.id, capability).await;
                assert_eq!(
                    result.is_ok(),
                    flags.allows(capability),
                    "mask {mask:03b}, capability {capability}"
                );
            }
        }
    }

    #[tokio::test]
    async fn any_matching_grant_row_is_sufficient() {
        let db = Arc::new(memory_pool().await);
        let mediator = AccessMediator::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bucket = seed_bucket(&db, "media", Some("a/")).await;

        seed_grant(&db, &alice, &bucket, caps(true, false, false)).await;
        seed_grant(&db, &alice, &bucket, caps(false, true, false)).await;

        let authorized = mediator
            .authorize(&alice, bucket.id, Capability::Upload)
            .await
            .unwrap();
        assert_eq!(authorized.bucket(), &bucket);
        assert_eq!(authorized.capability(), Capability::Upload);
        assert!(
            mediator
                .authorize(&alice, bucket.id, Capability::View)
                .await
                .is_ok()
        );
        assert!(matches!(
            mediator.authorize(&alice, bucket.id, Capability::Delete).await,
            Err(AccessError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn missing_bucket_and_missing_grant_are_distinguished_internally() {
        let db = Arc::new(memory_pool().await);
        let mediator = AccessMediator::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bucket = seed_bucket(&db, "media", None).await;

        assert!(matches!(
            mediator.authorize(&alice, 99, Capability::View).await,
            Err(AccessError::BucketNotFound(99))
        ));
        assert!(matches!(
            mediator.authorize(&alice, bucket.id, Capability::View).await,
            Err(AccessError::Forbidden { bucket_id, .. }) if bucket_id == bucket.id
        ));
    }

    #[tokio::test]
    async fn grants_of_other_users_do_not_leak() {
        let db = Arc::new(memory_pool().await);
        let mediator = AccessMediator::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let bucket = seed_bucket(&db, "media", None).await;
        seed_grant(&db, &bob, &bucket, caps(true, true, true)).await;

        assert_eq!(
            mediator.capabilities(&alice, bucket.id).await.unwrap(),
            CapabilitySet::default()
        );
        assert!(mediator.viewable_buckets(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn viewable_buckets_are_distinct_and_view_only() {
        let db = Arc::new(memory_pool().await);
        let mediator = AccessMediator::new(db.clone());
        let alice = seed_user(&db, "alice").await;
        let media = seed_bucket(&db, "media", None).await;
        let logs = seed_bucket(&db, "logs", Some("app/")).await;
        let drop_box = seed_bucket(&db, "drop-box", None).await;

        seed_grant(&db, &alice, &media, caps(true, false, false)).await;
        seed_grant(&db, &alice, &media, caps(true, true, false)).await;
        seed_grant(&db, &alice, &logs, caps(true, false, true)).await;
        seed_grant(&db, &alice, &drop_box, caps(false, true, false)).await;

        let visible = mediator.viewable_buckets(&alice).await.unwrap();
        assert_eq!(visible, vec![media, logs]);
    }
}
