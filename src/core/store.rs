//! Filesystem-backed record of downloaded media.
//!
//! There is no index file: a media page counts as downloaded when its final
//! file exists with a non-zero size. Writes land in a `.part` sibling first
//! and are renamed into place, so an interrupted write never produces a file
//! the skip guard would accept.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::SyncError;
use crate::domain::Bucket;

/// Suffix of in-flight downloads
pub const PART_SUFFIX: &str = ".part";

/// Completed downloads in one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketInventory {
    /// Distinct entries with at least one file
    pub entries: usize,
    /// Non-empty media files
    pub files: u64,
    /// Total size of those files
    pub bytes: u64,
}

/// Download root with one subtree per bucket
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.root.join(bucket.dir_name())
    }

    /// Create every bucket subtree
    pub async fn ensure_layout(&self) -> Result<(), SyncError> {
        for bucket in Bucket::ALL {
            let path = self.bucket_dir(bucket);
            fs::create_dir_all(&path)
                .await
                .map_err(|source| SyncError::Layout { path, source })?;
        }
        Ok(())
    }

    /// `{entry_id}_{page_index}{extension}`
    pub fn file_name(entry_id: u64, page_index: u32, extension: &str) -> String {
        format!("{}_{}{}", entry_id, page_index, extension)
    }

    pub fn media_path(&self, bucket: Bucket, entry_id: u64, page_index: u32, extension: &str) -> PathBuf {
        self.bucket_dir(bucket)
            .join(Self::file_name(entry_id, page_index, extension))
    }

    /// Skip guard: the file exists and is non-empty
    pub async fn is_satisfied(&self, path: &Path) -> bool {
        match fs::metadata(path).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Write `bytes` to `path` via a `.part` sibling
    pub async fn persist(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut part = path.as_os_str().to_owned();
        part.push(PART_SUFFIX);
        let part = PathBuf::from(part);

        let mut file = fs::File::create(&part).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&part, path).await
    }

    /// Count completed downloads per bucket
    pub async fn inventory(&self) -> std::io::Result<HashMap<Bucket, BucketInventory>> {
        let mut result = HashMap::new();

        for bucket in Bucket::ALL {
            let dir = self.bucket_dir(bucket);
            let mut summary = BucketInventory::default();
            let mut ids = BTreeSet::new();

            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    result.insert(bucket, summary);
                    continue;
                }
                Err(e) => return Err(e),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.ends_with(PART_SUFFIX) {
                    continue;
                }

                let meta = entry.metadata().await?;
                if !meta.is_file() || meta.len() == 0 {
                    continue;
                }

                summary.files += 1;
                summary.bytes += meta.len();
                if let Some((id, _)) = name.split_once('_') {
                    ids.insert(id.to_string());
                }
            }

            summary.entries = ids.len();
            result.insert(bucket, summary);
        }

        Ok(result)
    }
}
