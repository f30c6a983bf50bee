//! HTTP transport for the dashboard's JSON endpoints.
//!
//! DESIGN
//! ======
//! Every panel talks to the backend through the `Transport` trait so the
//! polling and dispatch logic can be exercised against a scripted mock.
//! `HttpTransport` is the production implementation over `reqwest`.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, non-2xx statuses and undecodable bodies all become
//! `ApiError` values. Callers fold them into a single "this call failed"
//! signal; nothing here panics or retries.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("request to {path} failed: {message}")]
    Network { path: String, message: String },
    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("invalid JSON from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("response is missing `{0}`")]
    MissingField(String),
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    /// Short text suitable for a user-facing notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } | Self::ClientBuild(_) => "connection error; is the ARIA server running?".to_owned(),
            Self::Status { status, .. } => format!("server error (HTTP {status})"),
            Self::Decode { .. } | Self::MissingField(_) => "unexpected response from server".to_owned(),
            Self::Rejected(message) => message.clone(),
        }
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// JSON request/response surface used by every panel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `path` and report only whether it answered with a 2xx status.
    async fn probe(&self, path: &str) -> Result<(), ApiError>;

    /// GET `path` and decode the body as JSON.
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    /// POST `path` with an optional JSON body and decode the reply.
    /// An empty reply body decodes as `Value::Null`.
    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport rooted at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, path: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network { path: path.to_owned(), message: e.to_string() })?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "api response");
        if !status.is_success() {
            return Err(ApiError::Status { path: path.to_owned(), status: status.as_u16() });
        }
        Ok(response)
    }

    async fn decode(path: &str, response: reqwest::Response) -> Result<Value, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network { path: path.to_owned(), message: e.to_string() })?;
        parse_body(path, &text)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, path: &str) -> Result<(), ApiError> {
        self.send(path, self.http.get(self.url(path))).await.map(|_| ())
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.send(path, self.http.get(self.url(path))).await?;
        Self::decode(path, response).await
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = self.send(path, request).await?;
        Self::decode(path, response).await
    }
}

pub(crate) fn parse_body(path: &str, text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Decode { path: path.to_owned(), message: e.to_string() })
}

/// Percent-encode a value for use in a query string or path segment.
#[must_use]
pub fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
