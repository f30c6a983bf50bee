//! Scripted `Transport` for panel tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::net::{ApiError, Transport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Probe,
    Get,
    Post,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

type Reply = Result<Value, ApiError>;

#[derive(Default)]
struct Script {
    queue: VecDeque<Reply>,
    fallback: Option<Reply>,
    delay: Option<Duration>,
}

/// Replies come from per-path scripts: queued one-shot replies first, then
/// the sticky reply. Unscripted paths answer HTTP 404.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request to `path` with `reply`.
    pub fn respond(&self, path: &str, reply: Reply) {
        self.script(path, |s| s.fallback = Some(reply));
    }

    /// Answer the next request to `path` with `reply`, ahead of the sticky reply.
    pub fn respond_once(&self, path: &str, reply: Reply) {
        self.script(path, |s| s.queue.push_back(reply));
    }

    /// Hold every reply to `path` for `delay` before returning it.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.script(path, |s| s.delay = Some(delay));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("mock mutex should lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock mutex should lock").len()
    }

    fn script(&self, path: &str, edit: impl FnOnce(&mut Script)) {
        let mut scripts = self.scripts.lock().expect("mock mutex should lock");
        edit(scripts.entry(path.to_owned()).or_default());
    }

    async fn answer(&self, method: Method, path: &str, body: Option<Value>) -> Reply {
        self.calls
            .lock()
            .expect("mock mutex should lock")
            .push(Call { method, path: path.to_owned(), body });

        let (reply, delay) = {
            let mut scripts = self.scripts.lock().expect("mock mutex should lock");
            match scripts.get_mut(path) {
                Some(script) => {
                    let reply = script.queue.pop_front().or_else(|| script.fallback.clone());
                    (reply, script.delay)
                }
                None => (None, None),
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply.unwrap_or_else(|| Err(ApiError::Status { path: path.to_owned(), status: 404 }))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn probe(&self, path: &str) -> Result<(), ApiError> {
        self.answer(Method::Probe, path, None).await.map(|_| ())
    }

    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.answer(Method::Get, path, None).await
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.answer(Method::Post, path, body).await
    }
}

pub fn network_error(path: &str) -> ApiError {
    ApiError::Network { path: path.to_owned(), message: "connection refused".to_owned() }
}
