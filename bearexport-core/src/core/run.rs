//! Shared progress state for one export run.
//!
//! The export worker is the only writer; any number of observers may read
//! the counters and error list while the run is in progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Live state of an export, shared behind an `Arc` with observers.
#[derive(Debug)]
pub struct ExportRun {
    started_at: DateTime<Utc>,
    finished_at: Mutex<Option<DateTime<Utc>>>,
    total_notes: AtomicU64,
    processed_notes: AtomicU64,
    files_copied: AtomicU64,
    errors: Mutex<Vec<String>>,
    fatal_error: Mutex<Option<String>>,
}

/// Point-in-time copy of an [`ExportRun`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_notes: u64,
    pub processed_notes: u64,
    pub files_copied: u64,
    pub errors: Vec<String>,
    pub fatal_error: Option<String>,
}

impl ExportSummary {
    /// Time from start to finish, or to now while still running.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }

    /// `true` once the run finished without a fatal error.
    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some() && self.fatal_error.is_none()
    }
}

// Poisoning only happens if a holder panicked mid-push; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ExportRun {
    /// Starts a new run stamped with the current time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: Mutex::new(None),
            total_notes: AtomicU64::new(0),
            processed_notes: AtomicU64::new(0),
            files_copied: AtomicU64::new(0),
            errors: Mutex::new(Vec::new()),
            fatal_error: Mutex::new(None),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *lock(&self.finished_at)
    }

    pub fn total_notes(&self) -> u64 {
        self.total_notes.load(Ordering::Acquire)
    }

    pub fn processed_notes(&self) -> u64 {
        self.processed_notes.load(Ordering::Acquire)
    }

    pub fn files_copied(&self) -> u64 {
        self.files_copied.load(Ordering::Acquire)
    }

    /// Recoverable errors in the order they were recorded.
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    pub fn fatal_error(&self) -> Option<String> {
        lock(&self.fatal_error).clone()
    }

    /// `true` once the run has finished or aborted.
    pub fn is_done(&self) -> bool {
        self.finished_at().is_some() || lock(&self.fatal_error).is_some()
    }

    pub fn snapshot(&self) -> ExportSummary {
        ExportSummary {
            started_at: self.started_at,
            finished_at: self.finished_at(),
            total_notes: self.total_notes(),
            processed_notes: self.processed_notes(),
            files_copied: self.files_copied(),
            errors: self.errors(),
            fatal_error: self.fatal_error(),
        }
    }

    pub(crate) fn set_total_notes(&self, total: u64) {
        self.total_notes.store(total, Ordering::Release);
    }

    pub(crate) fn note_processed(&self) {
        self.processed_notes.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn file_copied(&self) {
        self.files_copied.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn push_error(&self, message: String) {
        lock(&self.errors).push(message);
    }

    pub(crate) fn abort(&self, message: String) {
        *lock(&self.fatal_error) = Some(message);
    }

    pub(crate) fn finish(&self) {
        *lock(&self.finished_at) = Some(Utc::now());
    }
}

impl Default for ExportRun {
    fn default() -> Self {
        Self::new()
    }
}
