pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use db::DocumentStore;
use services::clock::Clock;
use services::identity::IdentityProvider;
use services::page_cache::PageCache;

/// Shared application state passed to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub cache: Arc<PageCache>,
    pub clock: Arc<dyn Clock>,
    pub config: config::AppConfig,
}
