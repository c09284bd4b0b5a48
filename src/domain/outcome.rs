//! Results of processing entries and of a whole synchronization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::Bucket;

/// What happened to an entry's membership in the remote collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Migration {
    /// Removed from the public collection and re-added privately with the completion tag
    Archived,

    /// Removed from the public collection only (entry no longer available at the source)
    RemovedUnavailable,

    /// Not every page was downloaded; left in the public collection for a later run
    Deferred,
}

/// Result of processing one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub entry_id: u64,

    pub bucket: Bucket,

    /// Pages with a completion witness on disk after the loop
    pub satisfied: u32,

    /// Pages that were already on disk before processing
    pub skipped: u32,

    /// Pages fetched and written during this run
    pub downloaded: u32,

    /// Pages whose fetch failed
    pub failed: u32,

    pub migration: Migration,
}

impl EntryOutcome {
    pub fn new(entry_id: u64, bucket: Bucket) -> Self {
        Self {
            entry_id,
            bucket,
            satisfied: 0,
            skipped: 0,
            downloaded: 0,
            failed: 0,
            migration: Migration::Deferred,
        }
    }
}

/// Aggregated statistics for one supervised synchronization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Number of traversal attempts, including the successful one
    pub attempts: u32,

    /// Collection pages fully processed
    pub pages: u32,

    pub entries: u32,
    pub archived: u32,
    pub removed_unavailable: u32,
    pub deferred: u32,

    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            attempts: 0,
            pages: 0,
            entries: 0,
            archived: 0,
            removed_unavailable: 0,
            deferred: 0,
            downloaded: 0,
            skipped: 0,
            failed: 0,
        }
    }

    /// Fold one entry's outcome into the totals
    pub fn record_entry(&mut self, outcome: &EntryOutcome) {
        self.entries += 1;
        self.downloaded += u64::from(outcome.downloaded);
        self.skipped += u64::from(outcome.skipped);
        self.failed += u64::from(outcome.failed);
        match outcome.migration {
            Migration::Archived => self.archived += 1,
            Migration::RemovedUnavailable => self.removed_unavailable += 1,
            Migration::Deferred => self.deferred += 1,
        }
    }

    /// Mark the run as finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration in seconds (until now if unfinished)
    pub fn elapsed_seconds(&self) -> i64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds()
    }
}
