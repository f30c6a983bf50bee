//! Proxy configuration parsed from environment variables.
//!
//! All knobs have defaults matching the development layout: the backend on
//! `localhost:5002` and the built front-end bundle under `frontend/build`.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5002";
pub const DEFAULT_STATIC_DIR: &str = "frontend/build";
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 60;

/// Backend paths reachable without the `/api` prefix.
pub const DEFAULT_DIRECT_PATHS: &[&str] = &["/test", "/chat", "/buscar_web", "/red_neuronal_info", "/entrenar_red_neuronal"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("backend URL must start with http:// or https://: {0}")]
    InvalidBackendUrl(String),
    #[error("direct path must be an absolute literal path: {0}")]
    InvalidDirectPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Backend origin without a trailing slash.
    pub backend_url: String,
    pub static_dir: PathBuf,
    pub direct_paths: Vec<String>,
    pub upstream_timeout: Duration,
}

impl ProxyConfig {
    /// Build the proxy config from process environment variables.
    ///
    /// - `PORT`: listen port (default 3000)
    /// - `ARIA_BIND_ADDR`: listen address (default `0.0.0.0`)
    /// - `ARIA_BACKEND_URL`: backend origin (default `http://localhost:5002`)
    /// - `ARIA_STATIC_DIR`: built front-end bundle (default `frontend/build`)
    /// - `ARIA_DIRECT_PATHS`: comma-separated allow-list of unprefixed backend paths
    /// - `ARIA_PROXY_TIMEOUT_SECS`: upstream request timeout (default 60)
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the proxy config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any looked-up value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let bind_addr = parse_or("ARIA_BIND_ADDR", lookup("ARIA_BIND_ADDR"), IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;

        let backend_url = lookup("ARIA_BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let backend_url = normalize_backend_url(&backend_url)?;

        let static_dir = lookup("ARIA_STATIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from);

        let direct_paths = match lookup("ARIA_DIRECT_PATHS") {
            Some(raw) => parse_direct_paths(&raw)?,
            None => DEFAULT_DIRECT_PATHS.iter().map(|p| (*p).to_owned()).collect(),
        };

        let timeout_secs = parse_or("ARIA_PROXY_TIMEOUT_SECS", lookup("ARIA_PROXY_TIMEOUT_SECS"), DEFAULT_PROXY_TIMEOUT_SECS)?;

        Ok(Self {
            bind_addr,
            port,
            backend_url,
            static_dir,
            direct_paths,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
    }
}

fn normalize_backend_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBackendUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Parse a comma-separated allow-list. Empty entries are skipped and trailing
/// slashes dropped so `/chat/` and `/chat` mean the same route.
pub(crate) fn parse_direct_paths(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut out = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !entry.starts_with('/') || entry.contains(['{', '}', '*']) {
            return Err(ConfigError::InvalidDirectPath(entry.to_owned()));
        }
        let path = entry.trim_end_matches('/');
        if path.is_empty() {
            return Err(ConfigError::InvalidDirectPath(entry.to_owned()));
        }
        if !out.iter().any(|p| p == path) {
            out.push(path.to_owned());
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
