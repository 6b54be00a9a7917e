//! legis-web library interface
//!
//! Exposes the router and application state for the binary and for
//! integration tests.

pub mod api;
pub mod auth;
pub mod error;
pub mod html;
pub mod pagination;

pub use crate::error::{WebError, WebResult};

use axum::Router;
use chrono::{DateTime, Utc};
use legis_common::ai::AnalysisService;
use legis_common::config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub config: Arc<Config>,
    /// Used by semantic search to embed the query
    pub ai: Arc<AnalysisService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config, ai: AnalysisService) -> Self {
        Self {
            db,
            config: Arc::new(config),
            ai: Arc::new(ai),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::legislative_routes())
        .merge(api::chart_routes())
        .merge(api::ai_routes())
        .merge(api::news_routes())
        .merge(api::task_routes())
        .merge(api::dashboard_routes())
        .merge(api::admin_routes())
        .merge(api::static_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
