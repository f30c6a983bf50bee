//! ARIA dashboard client.
//!
//! Holds the dashboard's state model behind a `Transport` seam: the status
//! poller, one feed per panel, the action dispatchers and the chat
//! transcript. Rendering is left to the caller; every piece of state is a
//! `tokio::sync::watch` channel that any number of views can subscribe to.

pub mod action;
pub mod config;
pub mod dashboard;
pub mod fetcher;
pub mod net;
pub mod panels;
pub mod poller;
pub mod scope;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use action::{ActionError, Notice, NoticeKind};
pub use config::{ClientConfig, PollIntervals};
pub use dashboard::Dashboard;
pub use net::{ApiError, HttpTransport, Transport};
pub use poller::Connectivity;
