//! Escalation and pacing policy over the two transports.
//!
//! The orchestrator owns the decision the transports never make: whether a
//! response is good enough to hand to the extractor. An insufficient
//! lightweight response escalates to the browser transport at most once per
//! attempt; a full attempt cycle repeats with exponential backoff up to the
//! configured cap, after which the page is declared exhausted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::fetch::{FetchResult, Transport};
use crate::platform::{Platform, PlatformSpec};
use crate::QuarryError;

pub struct FetchOrchestrator {
    light: Arc<dyn Transport>,
    browser: Arc<dyn Transport>,
    config: FetchConfig,
    /// Earliest permitted send time per platform; requests reserve a slot
    /// so concurrent workers stay spaced out
    next_allowed: Mutex<HashMap<Platform, Instant>>,
    escalations: AtomicU64,
}

impl FetchOrchestrator {
    pub fn new(light: Arc<dyn Transport>, browser: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self {
            light,
            browser,
            config,
            next_allowed: Mutex::new(HashMap::new()),
            escalations: AtomicU64::new(0),
        }
    }

    /// How many times the browser transport was engaged after a
    /// lightweight miss.
    pub fn escalations(&self) -> u64 {
        self.escalations.load(Ordering::Relaxed)
    }

    /// Fetches `url` until a sufficient body arrives or attempts run out.
    pub async fn acquire(&self, url: &str, spec: &PlatformSpec) -> Result<FetchResult, QuarryError> {
        for attempt in 1..=self.config.max_attempts {
            if !spec.prefers_browser {
                self.pace(spec.platform).await;
                match self.light.fetch(url).await {
                    Ok(result) if self.is_sufficient(&result, spec) => {
                        debug!(url, attempt, transport = "http", "page acquired");
                        return Ok(result);
                    }
                    Ok(result) => {
                        debug!(
                            url,
                            attempt,
                            status = result.status,
                            body_len = result.body.len(),
                            "lightweight response insufficient, escalating"
                        );
                    }
                    Err(e) => {
                        debug!(url, attempt, error = %e, "lightweight fetch failed, escalating");
                    }
                }
                self.escalations.fetch_add(1, Ordering::Relaxed);
            }

            self.pace(spec.platform).await;
            match self.browser.fetch(url).await {
                Ok(result) if self.is_sufficient(&result, spec) => {
                    info!(url, attempt, transport = "browser", "page acquired");
                    return Ok(result);
                }
                Ok(result) => {
                    warn!(
                        url,
                        attempt,
                        body_len = result.body.len(),
                        "browser response insufficient"
                    );
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "browser fetch failed");
                }
            }

            if attempt < self.config.max_attempts {
                let backoff = self.config.backoff_base_ms * 2u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
        }

        Err(QuarryError::FetchExhausted {
            url: url.to_string(),
        })
    }

    /// A response is sufficient when it succeeded, carries enough body to
    /// plausibly hold a listing, and contains the platform's marker.
    fn is_sufficient(&self, result: &FetchResult, spec: &PlatformSpec) -> bool {
        if !(200..300).contains(&result.status) {
            return false;
        }
        if result.body.len() < self.config.min_body_length {
            return false;
        }
        match spec.marker {
            Some(marker) => result.body.to_lowercase().contains(marker),
            None => true,
        }
    }

    /// Reserves the next send slot for `platform` and waits until it opens.
    async fn pace(&self, platform: Platform) {
        let wait = {
            let jitter = {
                let mut rng = rand::thread_rng();
                rng.gen_range(self.config.jitter_min_ms..=self.config.jitter_max_ms)
            };
            let interval = Duration::from_millis(self.config.min_request_interval_ms + jitter);

            let mut next_allowed = match self.next_allowed.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let slot = next_allowed.entry(platform).or_insert(now);
            let at = (*slot).max(now);
            *slot = at + interval;
            at.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
