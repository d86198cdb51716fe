//! A logical bucket: a named reference to a physical storage container.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bucket registered with the gateway.
///
/// `name` and `region` address the physical container at the storage
/// backend. When `prefix` is set, every key listed or written through this
/// bucket lives beneath it.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Logical identifier used in gateway URLs.
    pub id: i64,

    /// Physical bucket name at the storage backend.
    pub name: String,

    /// Region hosting the physical bucket (e.g. "eu-west-1").
    pub region: String,

    /// Optional key prefix scoping this bucket's objects.
    pub prefix: Option<String>,
}

impl Bucket {
    /// The key prefix, or the empty string when the bucket is unscoped.
    pub fn key_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or("")
    }
}
