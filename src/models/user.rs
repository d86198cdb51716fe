//! Authenticated principals.

use serde::Serialize;
use sqlx::FromRow;

/// A gateway user. Only active users can authenticate.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
}
