//! Service layer: everything between the HTTP handlers and the data stores.

pub mod access_service;
pub mod gateway_service;
pub mod registry_service;
pub mod user_service;
