//! Error taxonomy for the sync engine.
//!
//! Every failure is classified as either fatal (the run must stop, retrying
//! cannot help) or retryable (the supervisor restarts the traversal after a
//! cooldown). Per-image fetch failures never surface here; the item
//! processor absorbs them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while traversing and processing the collection
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to create download directory {}: {source}", .path.display())]
    Layout {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list collection: {source:#}")]
    Listing { source: anyhow::Error },

    #[error("Failed to load media pages for entry {entry_id}: {source:#}")]
    Detail {
        entry_id: u64,
        source: anyhow::Error,
    },

    #[error("Entry {entry_id} has an unparsable media URL {url}: {source}")]
    InvalidMediaUrl {
        entry_id: u64,
        url: String,
        source: url::ParseError,
    },

    #[error("Failed to save entry {entry_id} to {} (check permissions): {source}", .path.display())]
    Persist {
        entry_id: u64,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove entry {entry_id} from the collection: {source:#}")]
    Removal {
        entry_id: u64,
        source: anyhow::Error,
    },

    #[error("Failed to add entry {entry_id} to the private collection: {source:#}")]
    Addition {
        entry_id: u64,
        source: anyhow::Error,
    },

    #[error("{action} for entry {entry_id} was rejected: {status}")]
    Rejected {
        entry_id: u64,
        action: &'static str,
        status: String,
    },
}

impl SyncError {
    /// Fatal errors end the run instead of triggering a retry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Layout { .. } | SyncError::InvalidMediaUrl { .. } | SyncError::Persist { .. }
        )
    }

    /// Entry the error is about, if any
    pub fn entry_id(&self) -> Option<u64> {
        match self {
            SyncError::Layout { .. } | SyncError::Listing { .. } => None,
            SyncError::Detail { entry_id, .. }
            | SyncError::InvalidMediaUrl { entry_id, .. }
            | SyncError::Persist { entry_id, .. }
            | SyncError::Removal { entry_id, .. }
            | SyncError::Addition { entry_id, .. }
            | SyncError::Rejected { entry_id, .. } => Some(*entry_id),
        }
    }
}
