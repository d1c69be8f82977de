//! Lightweight HTTP transport.
//!
//! A plain reqwest client dressed up as an ordinary browser: rotating
//! desktop user agents, standard accept headers, and compression enabled.
//! Responses that look like anti-bot challenges are reported as
//! [`FetchError::Blocked`] so the orchestrator escalates instead of
//! retrying the same doomed request.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use tracing::debug;

use crate::fetch::{FetchError, FetchResult, Transport, TransportKind};

/// Desktop user agents rotated per request.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Body fragments that mark a challenge page regardless of status code.
const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "cf-challenge",
    "just a moment",
    "access denied",
    "verify you are human",
];

/// Builds the shared HTTP client.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// The lightweight transport. Cheap per request, first choice for every
/// platform that serves its markup server-side.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        if status == 403 || status == 429 {
            return Err(FetchError::Blocked { status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let elapsed = started.elapsed();

        if looks_blocked(&body) {
            debug!(url, status, "challenge page detected in response body");
            return Err(FetchError::Blocked { status });
        }

        Ok(FetchResult {
            final_url,
            status,
            body,
            elapsed,
        })
    }
}

fn looks_blocked(body: &str) -> bool {
    // Challenge pages are short; skip the scan on real content
    if body.len() > 20_000 {
        return false;
    }
    let lowered = body.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client().is_ok());
    }

    #[test]
    fn test_challenge_body_detected() {
        assert!(looks_blocked("<html><title>Just a moment...</title></html>"));
        assert!(!looks_blocked("<html><body>real game listing</body></html>"));
    }

    #[test]
    fn test_long_body_never_blocked() {
        let body = format!("{}captcha", "x".repeat(30_000));
        assert!(!looks_blocked(&body));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>games</html>"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(build_http_client().unwrap());
        let result = transport
            .fetch(&format!("{}/list", server.uri()))
            .await
            .unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body, "<html>games</html>");
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(build_http_client().unwrap());
        let err = transport.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked { status: 403 }));
    }

    #[tokio::test]
    async fn test_server_error_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(build_http_client().unwrap());
        let result = transport.fetch(&server.uri()).await.unwrap();
        assert_eq!(result.status, 500);
    }
}
