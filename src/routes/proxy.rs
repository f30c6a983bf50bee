//! Upstream forwarding to the ARIA backend.
//!
//! DESIGN
//! ======
//! Two entry points share one forwarder. `/api/*` requests lose their `/api`
//! prefix on the way upstream; allow-listed direct paths are forwarded as-is.
//! The upstream `Host` is taken from the backend origin, and hop-by-hop
//! headers are dropped in both directions. Bodies are buffered whole: the
//! backend speaks small JSON request/response pairs, never streams.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures talking to the backend surface as `502 Bad Gateway`
//! with a short text body. Nothing here retries; the dashboard's own timers
//! re-issue the request on their next tick.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::state::AppState;

pub const API_PREFIX: &str = "/api";
const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024 * 1024;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build upstream client: {0}")]
    ClientBuild(String),
    #[error("failed to read request body: {0}")]
    RequestBody(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("failed to assemble response: {0}")]
    ResponseBuild(String),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::RequestBody(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ClientBuild(_) | Self::ResponseBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(error = %self, %status, "proxy request failed");
        let body = match status {
            StatusCode::BAD_GATEWAY => "backend unavailable",
            StatusCode::PAYLOAD_TOO_LARGE => "request body too large",
            _ => "proxy error",
        };
        (status, body).into_response()
    }
}

// =============================================================================
// PATH + HEADER HELPERS
// =============================================================================

/// Strip the `/api` prefix on a segment boundary. `/api` alone maps to `/`;
/// `/apis` is not an API path.
pub(crate) fn strip_api_prefix(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(API_PREFIX)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

pub(crate) fn upstream_url(backend_url: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{backend_url}{path}?{q}"),
        _ => format!("{backend_url}{path}"),
    }
}

/// Headers that describe a single connection and must not be forwarded.
/// `host` and `content-length` are recomputed by the client and server.
pub(crate) fn is_connection_scoped(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    ) || *name == header::HOST
        || *name == header::CONTENT_LENGTH
}

pub(crate) fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_connection_scoped(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Forward `/api` and `/api/*` with the prefix removed.
pub async fn forward_api(State(state): State<AppState>, req: Request) -> Result<Response, ProxyError> {
    let path = req.uri().path();
    let rewritten = strip_api_prefix(path).unwrap_or(path).to_owned();
    forward(&state, req, &rewritten).await
}

/// Forward an allow-listed backend path unchanged.
pub async fn forward_direct(State(state): State<AppState>, req: Request) -> Result<Response, ProxyError> {
    let path = req.uri().path().to_owned();
    forward(&state, req, &path).await
}

async fn forward(state: &AppState, req: Request, path: &str) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::RequestBody(e.to_string()))?;
    let url = upstream_url(&state.config.backend_url, path, parts.uri.query());

    let upstream = state
        .upstream
        .request(parts.method.clone(), &url)
        .headers(filter_headers(&parts.headers))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = filter_headers(upstream.headers());
    let bytes = upstream.bytes().await?;
    debug!(method = %parts.method, %url, %status, bytes = bytes.len(), "proxied request");

    let mut response = Response::builder()
        .status(status)
        .body(Body::from(bytes))
        .map_err(|e| ProxyError::ResponseBuild(e.to_string()))?;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;
