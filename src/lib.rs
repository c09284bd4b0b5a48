//! pixiv-hunter - Pixiv bookmark synchronizer
//!
//! Downloads every image of every artwork in an account's public bookmark
//! collection, sorted into `safe/` and `r18/` by the artwork's first tag,
//! then moves each finished artwork into the private collection under a
//! completion tag.
//!
//! # Architecture
//!
//! The sync engine is built around a draining traversal:
//! - The same first page of the public collection is requested repeatedly
//! - Fully downloaded entries are migrated out, so the next request sees new ones
//! - The filesystem is the only state store; existing files are never fetched again
//! - Transient failures restart the traversal after a cooldown
//!
//! # Modules
//!
//! - `adapters`: Remote service seams and the Pixiv HTTP client
//! - `core`: Sync engine (LocalStore, ItemProcessor, PaginationDriver, RetrySupervisor)
//! - `domain`: Data structures (CatalogEntry, MediaPage, Bucket, SyncReport)
//! - `config`: Resolved settings
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Download and archive the public collection
//! PIXIV_SESSION=<id>_<secret> pixiv-hunter --path ./download
//!
//! # See what is on disk
//! pixiv-hunter status
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{CollectionClient, MediaFetcher, PixivClient, Visibility};
pub use config::Settings;
pub use core::{ItemProcessor, LocalStore, PaginationDriver, RetrySupervisor, SyncError};
pub use domain::{Bucket, CatalogEntry, EntryOutcome, MediaPage, Migration, SyncReport};
