//! Adapter interfaces for the remote service.
//!
//! The sync engine only talks to the outside world through these traits,
//! which keeps it testable with in-memory fakes. [`PixivClient`] is the
//! HTTP implementation used by the binary.

pub mod pixiv;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{CatalogEntry, MediaPage};

// Re-export the Pixiv adapter
pub use pixiv::PixivClient;

/// Literal status a mutation call reports on success
pub const SUCCESS_STATUS: &str = "success";

/// Visibility of a bookmark collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Visibility {
    /// Public bookmarks
    #[serde(rename = "show")]
    Public,

    /// Private bookmarks
    #[serde(rename = "hide")]
    Private,
}

impl Visibility {
    /// Value of the `rest` query parameter
    pub fn as_rest(&self) -> &'static str {
        match self {
            Visibility::Public => "show",
            Visibility::Private => "hide",
        }
    }

    /// Value of the `restrict` field on mutation calls
    pub fn as_restrict(&self) -> u8 {
        match self {
            Visibility::Public => 0,
            Visibility::Private => 1,
        }
    }
}

/// One page of the remote collection
#[derive(Debug, Clone, Default)]
pub struct CollectionPage {
    pub entries: Vec<CatalogEntry>,

    /// Entries outstanding in the collection at the time of the request
    pub total: u64,
}

/// Remote bookmark collection operations
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Establish a session; returns a human-readable account label
    async fn authenticate(&self, session: &str) -> Result<String>;

    /// List one page of the collection
    async fn list_collection(
        &self,
        tag: &str,
        visibility: Visibility,
        offset: u32,
        limit: u32,
    ) -> Result<CollectionPage>;

    /// Full media listing for one entry, in listing order
    async fn get_media_pages(&self, entry_id: u64) -> Result<Vec<MediaPage>>;

    /// Remove an entry from the public collection; returns the status literal
    async fn remove_from_collection(&self, entry_id: u64) -> Result<String>;

    /// Add an entry to a collection with tags; returns the status literal
    async fn add_to_collection(
        &self,
        entry_id: u64,
        visibility: Visibility,
        comment: &str,
        tags: &[String],
    ) -> Result<String>;
}

/// Retrieves media bytes by URL
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
