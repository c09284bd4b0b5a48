//! Domain types for the bookmark synchronizer.
//!
//! This module contains the core data structures:
//! - Entry: catalog entries, their media pages and storage bucket
//! - Outcome: per-entry results and the aggregated run report

pub mod entry;
pub mod outcome;

// Re-export commonly used types
pub use entry::{Bucket, CatalogEntry, MediaPage};
pub use outcome::{EntryOutcome, Migration, SyncReport};
