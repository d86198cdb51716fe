use anyhow::Result;
use sqlx::SqlitePool;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod storage;
#[cfg(test)]
mod test_support;
mod views;

use config::{AppConfig, Command, StorageBackend};
use storage::{DiskStore, MemoryStore, ObjectStore, S3Store};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting bucket-gateway with config: {:?}", cfg);

    // --- Initialize SQLite connection ---
    let db = Arc::new(db::connect(&cfg.database_url).await?);

    match command {
        Command::Serve => serve(cfg, db).await,
        Command::Migrate => {
            db::run_migrations(&db).await?;
            tracing::info!("Database migration complete.");
            Ok(())
        }
        admin => commands::run(admin, db).await,
    }
}

/// Construct the configured storage backend once; handlers share it.
async fn build_store(cfg: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match cfg.storage_backend {
        StorageBackend::S3 => Arc::new(S3Store::from_env().await),
        StorageBackend::Disk => {
            if !Path::new(&cfg.storage_dir).exists() {
                fs::create_dir_all(&cfg.storage_dir)?;
                tracing::info!("Created storage directory at {}", cfg.storage_dir);
            }
            Arc::new(DiskStore::new(&cfg.storage_dir))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; objects are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

async fn serve(cfg: AppConfig, db: Arc<SqlitePool>) -> Result<()> {
    let store = build_store(&cfg).await?;
    let state = state::AppState::new(db, store);

    // --- Build router ---
    let app = routes::routes::app(state, &cfg);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
