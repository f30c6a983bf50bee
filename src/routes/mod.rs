//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router stitches the built dashboard bundle to the backend:
//! `/api/*` and a fixed allow-list of direct paths are proxied, `/healthz`
//! answers locally, and every other path is served from the static bundle
//! with an `index.html` fallback so client-side routes survive a reload.

pub mod proxy;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{any, get};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;

/// Build the full proxy router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();
    let spa = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route(proxy::API_PREFIX, any(proxy::forward_api))
        .route("/api/{*rest}", any(proxy::forward_api));

    for path in routable_direct_paths(&state.config.direct_paths) {
        router = router
            .route(path, any(proxy::forward_direct))
            .route(&format!("{path}/{{*rest}}"), any(proxy::forward_direct));
    }

    router
        .fallback_service(spa)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Direct paths that can be mounted without colliding with the API prefix,
/// the health probe, or another direct path's subtree.
pub(crate) fn routable_direct_paths(paths: &[String]) -> Vec<&str> {
    let reserved = |p: &str| proxy::strip_api_prefix(p).is_some() || p == "/healthz";
    let nested = |p: &str| {
        paths
            .iter()
            .any(|other| other != p && p.starts_with(other.as_str()) && p[other.len()..].starts_with('/'))
    };

    let mut out = Vec::new();
    for path in paths {
        if reserved(path) || nested(path) {
            warn!(%path, "direct path skipped: overlaps another route");
            continue;
        }
        out.push(path.as_str());
    }
    out
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
