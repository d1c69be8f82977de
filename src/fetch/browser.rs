//! Headless browser transport.
//!
//! Chrome instances are expensive, so a small pool caps how many are alive
//! at once and reuses them across requests. A browser that errors mid-fetch
//! is discarded rather than returned; the next checkout launches a fresh
//! one. All CDP calls are synchronous and run on the blocking thread pool.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::fetch::{FetchError, FetchResult, Transport, TransportKind};

/// A capped pool of headless Chrome instances.
pub struct BrowserPool {
    permits: Semaphore,
    idle: Mutex<Vec<Browser>>,
}

impl BrowserPool {
    pub fn new(size: usize) -> Self {
        Self {
            permits: Semaphore::new(size.max(1)),
            idle: Mutex::new(Vec::new()),
        }
    }

    fn checkout(&self) -> Result<Browser, FetchError> {
        let reused = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop());
        match reused {
            Some(browser) => Ok(browser),
            None => {
                debug!("launching headless browser");
                Browser::new(LaunchOptions {
                    headless: true,
                    ..Default::default()
                })
                .map_err(|e| FetchError::Browser(e.to_string()))
            }
        }
    }

    fn check_in(&self, browser: Browser) {
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(browser);
        }
    }
}

/// The escalation transport: full page render in headless Chrome, then a
/// settle period so client-side markup has time to appear.
pub struct BrowserTransport {
    pool: Arc<BrowserPool>,
    settle: Duration,
}

impl BrowserTransport {
    pub fn new(pool: Arc<BrowserPool>, settle: Duration) -> Self {
        Self { pool, settle }
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Browser
    }

    async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let _permit = self
            .pool
            .permits
            .acquire()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        let pool = Arc::clone(&self.pool);
        let settle = self.settle;
        let url = url.to_string();

        tokio::task::spawn_blocking(move || {
            let browser = pool.checkout()?;
            let started = Instant::now();
            match render_page(&browser, &url, settle) {
                Ok((final_url, body)) => {
                    pool.check_in(browser);
                    Ok(FetchResult {
                        final_url,
                        status: 200,
                        body,
                        elapsed: started.elapsed(),
                    })
                }
                Err(e) => {
                    // Drop the browser; its process may be wedged
                    warn!(url = %url, error = %e, "browser fetch failed, discarding instance");
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?
    }
}

fn render_page(browser: &Browser, url: &str, settle: Duration) -> Result<(String, String), FetchError> {
    let tab = browser
        .new_tab()
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    let result = (|| {
        tab.navigate_to(url)
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| FetchError::Browser(e.to_string()))?;

        // Give client-side rendering time to fill the page in
        std::thread::sleep(settle);

        let body = tab
            .get_content()
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        Ok((tab.get_url(), body))
    })();

    let _ = tab.close(true);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_floor_is_one() {
        let pool = BrowserPool::new(0);
        assert_eq!(pool.permits.available_permits(), 1);
    }

    #[test]
    fn test_pool_caps_permits() {
        let pool = BrowserPool::new(3);
        assert_eq!(pool.permits.available_permits(), 3);
    }
}
