//! Static asset handlers
//!
//! Embeds the stylesheet at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const LEGIS_CSS: &str = include_str!("../../static/legis.css");

/// GET /static/legis.css
pub async fn serve_legis_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css; charset=utf-8"),
            ("cache-control", "public, max-age=3600"),
        ],
        LEGIS_CSS,
    )
        .into_response()
}

pub fn static_routes() -> Router<AppState> {
    Router::new().route("/static/legis.css", get(serve_legis_css))
}
