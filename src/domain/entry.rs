//! Catalog entries and the media pages that compose them.
//!
//! Entries are read from the remote collection once per page and never
//! mutated afterwards; everything derived from them (bucket, file names)
//! is therefore stable for the lifetime of a run.

use serde::{Deserialize, Serialize};
use url::Url;

/// One item (artwork) in the remote public collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Remote artwork id
    pub id: u64,

    /// Display title
    pub title: String,

    /// Ordered tags; the first one carries the content-rating signal
    pub tags: Vec<String>,

    /// Author account name
    pub author: String,

    /// Number of images the artwork is made of
    pub page_count: u32,
}

impl CatalogEntry {
    /// Storage bucket for this entry, derived from `tags[0]`
    pub fn bucket(&self, restricted_marker: &str) -> Bucket {
        Bucket::classify(&self.tags, restricted_marker)
    }

    /// Whether the source reports this entry as gone.
    ///
    /// Detection is a literal title match and will misfire on an artwork
    /// that is genuinely titled with the sentinel.
    pub fn is_unavailable(&self, sentinel: &str) -> bool {
        self.title == sentinel
    }
}

/// One image belonging to an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPage {
    /// 0-based position inside the entry
    pub index: u32,

    /// URL of the original-resolution image
    pub original_url: String,
}

impl MediaPage {
    pub fn new(index: u32, original_url: impl Into<String>) -> Self {
        Self {
            index,
            original_url: original_url.into(),
        }
    }

    /// File extension of the original URL's path, dot included.
    ///
    /// Returns an empty string when the last path segment has no dot.
    pub fn extension(&self) -> Result<String, url::ParseError> {
        let url = Url::parse(&self.original_url)?;
        let last = url.path().rsplit('/').next().unwrap_or_default();
        Ok(last
            .rfind('.')
            .map(|dot| last[dot..].to_string())
            .unwrap_or_default())
    }
}

/// Classification-derived storage subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Safe,
    Restricted,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Safe, Bucket::Restricted];

    /// Classify by looking for the restricted marker in the first tag only
    pub fn classify(tags: &[String], restricted_marker: &str) -> Self {
        match tags.first() {
            Some(first) if first.contains(restricted_marker) => Bucket::Restricted,
            _ => Bucket::Safe,
        }
    }

    /// Directory name under the download root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Bucket::Safe => "safe",
            Bucket::Restricted => "r18",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
