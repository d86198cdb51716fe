//! HTTP handlers. `api_handlers` and `html_handlers` are two presentations
//! of the same gateway operations.

pub mod api_handlers;
pub mod auth;
pub mod health_handlers;
pub mod html_handlers;
pub mod path;
mod upload;
