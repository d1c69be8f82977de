//! Crawl session lifecycle.
//!
//! A session is one platform's pass through the pipeline: walk list pages,
//! then drain the detail queue through a worker pool, checkpointing as it
//! goes so an interrupted session resumes where it stopped.

mod runner;

pub use runner::CrawlSession;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::platform::Platform;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ListingInProgress,
    DetailInProgress,
    /// Ran to the end of its limits
    Completed,
    /// Stopped by a cancel request; resume state is intact
    Cancelled,
    /// A list page could not be acquired at all
    Failed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::ListingInProgress => "listing",
            SessionState::DetailInProgress => "detail",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Per-session tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounts {
    /// New records accepted into the store
    pub accepted: usize,
    /// Detail pages that resolved to an already-stored URL
    pub duplicates: usize,
    /// Detail pages that could not be acquired
    pub failed: usize,
}

/// Final report of one session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub platform: Platform,
    pub state: SessionState,
    pub counts: SessionCounts,
    /// List pages walked this session
    pub pages_walked: u32,
    /// Populated when `state` is `Failed`
    pub failure: Option<String>,
}

/// A point-in-time view of a running session.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot {
    pub state: SessionState,
    pub counts: SessionCounts,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            counts: SessionCounts::default(),
        }
    }
}

/// Live progress of a session, shared with whoever wants to poll it. The
/// session is the only writer; observers only take snapshots.
#[derive(Debug, Default)]
pub struct Progress(std::sync::Mutex<ProgressSnapshot>);

impl Progress {
    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.lock()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.lock().state = state;
    }

    pub(crate) fn update<F: FnOnce(&mut SessionCounts)>(&self, f: F) {
        f(&mut self.lock().counts)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressSnapshot> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Cooperative cancellation flag shared between a session and whoever asked
/// it to stop. Checked at iteration boundaries; in-flight requests finish.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Completed.to_string(), "completed");
        assert_eq!(SessionState::Failed.to_string(), "failed");
    }
}
