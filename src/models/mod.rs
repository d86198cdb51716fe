//! Core data models for the bucket gateway.
//!
//! These entities mirror the relational tables (buckets, grants, users) via
//! `sqlx::FromRow` and serialize as JSON via `serde` where they leave the API.

pub mod bucket;
pub mod permission;
pub mod user;
