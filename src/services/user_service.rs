//! Users and API tokens: the session store requests authenticate against.

use crate::models::user::User;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    db: Arc<SqlitePool>,
}

impl UserService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, username: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, is_active, created_at) VALUES (?, 1, ?)
             RETURNING id, username, is_active",
        )
        .bind(username)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username, is_active FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&*self.db)
            .await
    }

    pub async fn set_active(&self, user_id: i64, active: bool) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(user_id)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Mint a new opaque token for `user_id`.
    pub async fn issue_token(&self, user_id: i64) -> Result<String, sqlx::Error> {
        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO api_tokens (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&*self.db)
            .await?;
        Ok(token)
    }

    /// Resolve a presented token to its active owner.
    pub async fn user_for_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.is_active
             FROM api_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.token = ? AND u.is_active = 1",
        )
        .bind(token)
        .fetch_optional(&*self.db)
        .await
    }
}
