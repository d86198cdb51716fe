//! Defines routes for the gateway.
//!
//! ## Structure
//! - **JSON API** (bearer token or session cookie)
//!   - `GET    /api/buckets/` — list viewable buckets
//!   - `GET    /api/buckets/{bucket_id}/objects/` — list object keys
//!   - `POST   /api/buckets/{bucket_id}/upload/` — upload (multipart `file`)
//!   - `DELETE /api/buckets/{bucket_id}/objects/{key}/` — delete object
//!
//! - **HTML pages**
//!   - `GET  /buckets/` — bucket index
//!   - `GET  /buckets/{bucket_id}/` — object listing with forms
//!   - `POST /buckets/{bucket_id}/upload/` — upload, redirects back
//!   - `POST /buckets/{bucket_id}/delete/` — delete (form field `key`), redirects back
//!
//! - **Probes**: `/healthz`, `/readyz`

use crate::{
    config::AppConfig,
    handlers::{
        api_handlers,
        health_handlers::{healthz, readyz},
        html_handlers,
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{delete, get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// The served application: every route plus the transport layers.
///
/// Bodies above `max_upload_bytes` are refused with 413 and requests running
/// past `request_timeout` are answered with 408.
pub fn app(state: AppState, cfg: &AppConfig) -> Router {
    routes()
        .layer(DefaultBodyLimit::max(cfg.max_upload_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            cfg.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the router for every gateway route, without transport layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // JSON API
        .route("/api/buckets/", get(api_handlers::list_buckets))
        .route(
            "/api/buckets/{bucket_id}/objects/",
            get(api_handlers::list_objects),
        )
        .route(
            "/api/buckets/{bucket_id}/upload/",
            post(api_handlers::upload_object),
        )
        .route(
            "/api/buckets/{bucket_id}/objects/{key}/",
            delete(api_handlers::delete_object),
        )
        // HTML pages
        .route("/buckets/", get(html_handlers::bucket_index))
        .route("/buckets/{bucket_id}/", get(html_handlers::object_listing))
        .route(
            "/buckets/{bucket_id}/upload/",
            post(html_handlers::upload_object),
        )
        .route(
            "/buckets/{bucket_id}/delete/",
            post(html_handlers::delete_object),
        )
}
