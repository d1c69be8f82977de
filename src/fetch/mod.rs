//! Page acquisition with lightweight-first escalation.
//!
//! Every page goes through the same path: the lightweight HTTP transport
//! first, and only when its response is insufficient (bad status, truncated
//! body, or missing platform marker) does the orchestrator escalate to a
//! headless browser. Platforms that render their content client-side can
//! opt out of the lightweight pass entirely.

mod browser;
mod orchestrator;
mod transport;

pub use browser::{BrowserPool, BrowserTransport};
pub use orchestrator::FetchOrchestrator;
pub use transport::{build_http_client, HttpTransport};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a single transport request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection failure, DNS failure, broken transfer
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with an anti-bot challenge or refusal
    #[error("blocked by server (status {status})")]
    Blocked { status: u16 },

    /// Headless browser failure (launch, navigation, or content read)
    #[error("browser error: {0}")]
    Browser(String),
}

/// A successfully completed transport request. The body may still be
/// insufficient for extraction; that judgement belongs to the orchestrator.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects
    pub final_url: String,
    /// HTTP status code; browser transports report 200 on a rendered page
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

/// Which transport produced a result; used for logging and escalation
/// accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    Browser,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Browser => write!(f, "browser"),
        }
    }
}

/// One way of turning a URL into a page body.
///
/// The orchestrator holds two of these, one lightweight and one
/// browser-backed, and never cares which concrete type sits behind the
/// trait. Tests substitute scripted transports here.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError>;
}
