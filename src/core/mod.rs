//! Synchronization engine.
//!
//! This module contains:
//! - LocalStore: on-disk record of downloaded media
//! - ItemProcessor: per-entry download and migration
//! - PaginationDriver: draining traversal of the collection
//! - RetrySupervisor: cooldown and restart on transient failure

pub mod error;
pub mod processor;
pub mod store;
pub mod supervisor;
pub mod traversal;

// Re-export commonly used types
pub use error::SyncError;
pub use processor::ItemProcessor;
pub use store::{BucketInventory, LocalStore};
pub use supervisor::RetrySupervisor;
pub use traversal::PaginationDriver;
