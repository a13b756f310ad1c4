//! scorecard-sync library interface
//!
//! Exposes the router, state, and pipeline modules for integration
//! testing.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod sheets;
pub mod sync;

pub use crate::error::{SyncError, SyncResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::sync::SyncOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Sync run coordinator
    pub orchestrator: Arc<SyncOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::sync_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
}
