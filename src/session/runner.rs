//! The session runner.
//!
//! Listing is sequential: pages are walked in order from the persisted
//! cursor. The cursor is persisted only once the detail queue has
//! drained, so a cancelled run re-walks its pages on restart and
//! re-discovers any links it had queued but not yet processed. Detail
//! pages have no ordering requirement, so they drain through a small
//! worker pool.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SessionConfig;
use crate::extract::{extract_detail, extract_list, ListEntry};
use crate::fetch::FetchOrchestrator;
use crate::platform::{Platform, PlatformSpec};
use crate::record::GameRecord;
use crate::session::{CancelToken, Progress, SessionReport, SessionState};
use crate::store::{GameStore, SubmitOutcome};
use crate::QuarryError;

pub struct CrawlSession {
    spec: &'static PlatformSpec,
    orchestrator: Arc<FetchOrchestrator>,
    store: Arc<GameStore>,
    config: SessionConfig,
    cancel: CancelToken,
    progress: Arc<Progress>,
}

impl CrawlSession {
    pub fn new(
        platform: Platform,
        orchestrator: Arc<FetchOrchestrator>,
        store: Arc<GameStore>,
        config: SessionConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            spec: platform.spec(),
            orchestrator,
            store,
            config,
            cancel,
            progress: Arc::new(Progress::default()),
        }
    }

    /// Shared handle for polling this session's live state and tallies.
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// Runs the session to completion, cancellation, or failure.
    pub async fn run(self) -> Result<SessionReport, QuarryError> {
        let platform = self.spec.platform;

        let visited = self.store.load_visited(platform.id())?;
        let start_page = self.store.load_checkpoint(platform.id())?.unwrap_or(0);
        if start_page > 0 {
            info!(platform = platform.id(), start_page, "resuming from checkpoint");
        }

        self.progress.set_state(SessionState::ListingInProgress);
        let mut pages_walked = 0u32;
        let (queue, cursor) = match self.walk_listing(start_page, &visited, &mut pages_walked).await {
            Ok(walked) => walked,
            Err(QuarryError::FetchExhausted { url }) => {
                warn!(platform = platform.id(), url, "list page unreachable, session failed");
                self.progress.set_state(SessionState::Failed);
                return Ok(self.report(pages_walked, Some(format!("list page unreachable: {}", url))));
            }
            Err(e) => return Err(e),
        };

        if self.cancel.is_cancelled() {
            self.progress.set_state(SessionState::Cancelled);
            return Ok(self.report(pages_walked, None));
        }

        info!(
            platform = platform.id(),
            queued = queue.len(),
            pages = pages_walked,
            "listing phase done"
        );

        self.progress.set_state(SessionState::DetailInProgress);
        self.drain_details(queue).await;

        if self.cancel.is_cancelled() {
            // Leave the old cursor in place; the links still in the queue
            // are only recoverable by re-walking the pages that held them
            self.progress.set_state(SessionState::Cancelled);
        } else {
            self.store.save_checkpoint(platform.id(), cursor)?;
            self.progress.set_state(SessionState::Completed);
        }

        let report = self.report(pages_walked, None);
        info!(
            platform = platform.id(),
            state = %report.state,
            accepted = report.counts.accepted,
            duplicates = report.counts.duplicates,
            failed = report.counts.failed,
            "session finished"
        );
        Ok(report)
    }

    fn report(&self, pages_walked: u32, failure: Option<String>) -> SessionReport {
        let snapshot = self.progress.snapshot();
        SessionReport {
            platform: self.spec.platform,
            state: snapshot.state,
            counts: snapshot.counts,
            pages_walked,
            failure,
        }
    }

    /// Walks list pages from `start_page`, collecting unseen detail URLs in
    /// listing order. Stops on the page limit, the item limit, a page with
    /// no entries at all, or cancellation. A page whose entries are all
    /// already known still advances; deeper pages may hold new items.
    ///
    /// Returns the queue and the cursor just past the last walked page. The
    /// cursor is not persisted here; the caller saves it once the queue has
    /// been drained.
    async fn walk_listing(
        &self,
        start_page: u32,
        visited: &HashSet<String>,
        pages_walked: &mut u32,
    ) -> Result<(Vec<ListEntry>, u32), QuarryError> {
        let platform = self.spec.platform;
        let mut queue: Vec<ListEntry> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page = start_page;
        let mut cursor = start_page;

        while *pages_walked < self.config.max_list_pages {
            if self.cancel.is_cancelled() {
                return Ok((queue, cursor));
            }

            let list_url = self.spec.list_url(page);
            let result = self.orchestrator.acquire(&list_url, self.spec).await?;
            *pages_walked += 1;
            cursor = page + 1;

            let base = Url::parse(&list_url)?;
            let entries = extract_list(&result.body, &base, self.spec);
            debug!(platform = platform.id(), page, found = entries.len(), "list page extracted");

            if entries.is_empty() {
                debug!(platform = platform.id(), page, "empty list page, stopping listing");
                break;
            }

            for entry in entries {
                let key = entry.url.as_str().to_string();
                if !seen.insert(key.clone()) {
                    continue;
                }
                if visited.contains(&key) {
                    continue;
                }
                if self.store.contains(&key)? {
                    self.progress.update(|counts| counts.duplicates += 1);
                    continue;
                }
                queue.push(entry);
            }

            if self.config.max_items > 0 && queue.len() >= self.config.max_items {
                queue.truncate(self.config.max_items);
                break;
            }
            if !self.spec.is_paginated() {
                break;
            }
            page += 1;
        }

        Ok((queue, cursor))
    }

    /// Drains the detail queue through a bounded worker pool.
    async fn drain_details(&self, entries: Vec<ListEntry>) {
        let queue = Arc::new(Mutex::new(VecDeque::from(entries)));
        let mut workers = JoinSet::new();

        for _ in 0..self.config.detail_workers.max(1) {
            let queue = Arc::clone(&queue);
            let progress = Arc::clone(&self.progress);
            let orchestrator = Arc::clone(&self.orchestrator);
            let store = Arc::clone(&self.store);
            let cancel = self.cancel.clone();
            let spec = self.spec;
            let max_items = self.config.max_items;

            workers.spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    if max_items > 0 && progress.snapshot().counts.accepted >= max_items {
                        break;
                    }
                    let Some(entry) = lock(&queue).pop_front() else {
                        break;
                    };
                    process_entry(&entry, spec, &orchestrator, &store, &progress).await;
                }
            });
        }

        while workers.join_next().await.is_some() {}
    }
}

/// Fetches one detail page, extracts its playable address, and submits the
/// record. Only a stored page is marked visited; an exhausted fetch or an
/// unresolved page leaves the URL eligible for the next session.
async fn process_entry(
    entry: &ListEntry,
    spec: &'static PlatformSpec,
    orchestrator: &FetchOrchestrator,
    store: &GameStore,
    progress: &Progress,
) {
    let platform = spec.platform;
    let url = entry.url.as_str();

    let result = match orchestrator.acquire(url, spec).await {
        Ok(result) => result,
        Err(e) => {
            warn!(platform = platform.id(), url, error = %e, "detail page failed");
            progress.update(|counts| counts.failed += 1);
            return;
        }
    };

    let detail = extract_detail(&result.body, &entry.url, spec);
    if detail.is_empty() {
        // Unresolved pages are never persisted. Leaving the URL out of the
        // store and the visited set lets a later run retry it.
        warn!(platform = platform.id(), url, "no playable address extracted, skipping");
        progress.update(|counts| counts.failed += 1);
        return;
    }

    let record = GameRecord::new(
        entry.name.clone(),
        entry.url.to_string(),
        detail.embed_url,
        detail.iframe_url,
        platform,
    );

    match store.submit(&record) {
        Ok(SubmitOutcome::Accepted) => {
            info!(platform = platform.id(), name = %record.name, url, "record accepted");
            progress.update(|counts| counts.accepted += 1);
        }
        Ok(SubmitOutcome::DuplicateSkipped) => {
            debug!(platform = platform.id(), url, "duplicate skipped");
            progress.update(|counts| counts.duplicates += 1);
        }
        Err(e) => {
            warn!(platform = platform.id(), url, error = %e, "store rejected record");
            progress.update(|counts| counts.failed += 1);
            return;
        }
    }

    if let Err(e) = store.record_visited(platform.id(), url) {
        warn!(platform = platform.id(), url, error = %e, "failed to persist visited mark");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
