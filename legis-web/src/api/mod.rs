//! HTTP handlers for legis-web
//!
//! Each submodule owns one area of the site and exposes a `*_routes()`
//! function merged by [`crate::build_router`].

pub mod admin;
pub mod ai;
pub mod charts;
pub mod dashboard;
pub mod health;
pub mod legislative;
pub mod news;
pub mod static_assets;
pub mod tasks;

pub use admin::admin_routes;
pub use ai::ai_routes;
pub use charts::chart_routes;
pub use dashboard::dashboard_routes;
pub use health::health_routes;
pub use legislative::legislative_routes;
pub use news::news_routes;
pub use static_assets::static_routes;
pub use tasks::task_routes;

use crate::WebError;

/// Fallback for unmatched paths
pub async fn not_found() -> WebError {
    WebError::NotFound("Página".to_string())
}
