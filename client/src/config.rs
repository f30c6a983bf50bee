//! Dashboard client configuration parsed from environment variables.

use std::time::Duration;

use crate::state::chat::ChatMode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Per-panel refresh cadence. Panels never coordinate their timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub status: Duration,
    pub auto_learning: Duration,
    pub learning: Duration,
    pub dictionary: Duration,
    pub advanced: Duration,
    pub emotions: Duration,
    pub cloud_stats: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(30),
            auto_learning: Duration::from_secs(30),
            learning: Duration::from_secs(10),
            dictionary: Duration::from_secs(30),
            advanced: Duration::from_secs(5),
            emotions: Duration::from_secs(3),
            cloud_stats: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub intervals: PollIntervals,
    pub chat_mode: ChatMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            intervals: PollIntervals::default(),
            chat_mode: ChatMode::default(),
        }
    }
}

impl ClientConfig {
    /// Build client config from environment variables.
    ///
    /// Optional:
    /// - `ARIA_BASE_URL`: dashboard origin (default `http://127.0.0.1:3000`)
    /// - `ARIA_REQUEST_TIMEOUT_SECS`: default 30
    /// - `ARIA_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ARIA_POLL_{STATUS,AUTO_LEARNING,LEARNING,DICTIONARY,ADVANCED,EMOTIONS,CLOUD_STATS}_SECS`
    /// - `ARIA_CHAT_MODE`: `standard` (default) or `futuristic`
    ///
    /// Unparseable or zero values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PollIntervals::default();
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map_or(default, Duration::from_secs)
        };

        let intervals = PollIntervals {
            status: secs("ARIA_POLL_STATUS_SECS", defaults.status),
            auto_learning: secs("ARIA_POLL_AUTO_LEARNING_SECS", defaults.auto_learning),
            learning: secs("ARIA_POLL_LEARNING_SECS", defaults.learning),
            dictionary: secs("ARIA_POLL_DICTIONARY_SECS", defaults.dictionary),
            advanced: secs("ARIA_POLL_ADVANCED_SECS", defaults.advanced),
            emotions: secs("ARIA_POLL_EMOTIONS_SECS", defaults.emotions),
            cloud_stats: secs("ARIA_POLL_CLOUD_STATS_SECS", defaults.cloud_stats),
        };

        let base_url = lookup("ARIA_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        Self {
            base_url,
            request_timeout_secs: env_u64(&lookup, "ARIA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_u64(&lookup, "ARIA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            intervals,
            chat_mode: lookup("ARIA_CHAT_MODE").and_then(|v| ChatMode::parse(&v)).unwrap_or_default(),
        }
    }
}

fn env_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
