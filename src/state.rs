//! Shared, read-only application state handed to every handler.

use crate::{
    services::{
        access_service::AccessMediator, gateway_service::GatewayService, user_service::UserService,
    },
    storage::ObjectStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub users: UserService,
    pub gateway: GatewayService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            users: UserService::new(db.clone()),
            gateway: GatewayService::new(AccessMediator::new(db.clone()), store),
            db,
        }
    }
}
