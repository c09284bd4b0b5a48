//! Per-entry download and migration.
//!
//! For one catalog entry: classify it, download every media page that is not
//! already on disk, and once every page has a witness (or the source reports
//! the entry gone) move it out of the public collection.

use tracing::{debug, info, instrument, warn};

use super::error::SyncError;
use super::store::LocalStore;
use crate::adapters::{CollectionClient, MediaFetcher, Visibility, SUCCESS_STATUS};
use crate::config::Settings;
use crate::domain::{Bucket, CatalogEntry, EntryOutcome, Migration};

/// Downloads and migrates single entries
pub struct ItemProcessor<'a> {
    client: &'a dyn CollectionClient,
    fetcher: &'a dyn MediaFetcher,
    store: &'a LocalStore,
    settings: &'a Settings,
}

impl<'a> ItemProcessor<'a> {
    pub fn new(
        client: &'a dyn CollectionClient,
        fetcher: &'a dyn MediaFetcher,
        store: &'a LocalStore,
        settings: &'a Settings,
    ) -> Self {
        Self {
            client,
            fetcher,
            store,
            settings,
        }
    }

    /// Process one entry.
    ///
    /// A failed image fetch is logged and skipped; the entry then stays in
    /// the public collection so a later run picks up the missing page. Detail
    /// and migration failures are returned as retryable errors, disk write
    /// failures as fatal ones. An unavailable entry whose pages cannot be
    /// loaded goes straight to removal.
    #[instrument(skip(self, entry), fields(entry_id = entry.id))]
    pub async fn process(&self, entry: &CatalogEntry) -> Result<EntryOutcome, SyncError> {
        let bucket = entry.bucket(&self.settings.restricted_marker);
        let unavailable = entry.is_unavailable(&self.settings.unavailable_title);
        let mut outcome = EntryOutcome::new(entry.id, bucket);

        info!(
            title = %entry.title,
            author = %entry.author,
            pages = entry.page_count,
            "Processing entry"
        );
        if !self.settings.hide_tags {
            info!(tags = ?entry.tags, restricted = bucket == Bucket::Restricted, "Entry tags");
        }

        // Deleted works answer the pages request with an error envelope.
        let pages = match self.client.get_media_pages(entry.id).await {
            Ok(pages) => pages,
            Err(e) if unavailable => {
                warn!(error = %e, "No media pages for unavailable entry");
                Vec::new()
            }
            Err(source) => {
                return Err(SyncError::Detail {
                    entry_id: entry.id,
                    source,
                })
            }
        };

        for page in &pages {
            let extension = page
                .extension()
                .map_err(|source| SyncError::InvalidMediaUrl {
                    entry_id: entry.id,
                    url: page.original_url.clone(),
                    source,
                })?;
            let path = self
                .store
                .media_path(bucket, entry.id, page.index, &extension);
            let file = LocalStore::file_name(entry.id, page.index, &extension);

            if self.store.is_satisfied(&path).await {
                outcome.skipped += 1;
                outcome.satisfied += 1;
                let progress = format!("{}/{}", outcome.satisfied, entry.page_count);
                info!(%file, %progress, "Already downloaded, skipping");
                continue;
            }

            debug!(url = %page.original_url, "Fetching original");
            let bytes = match self.fetcher.fetch_bytes(&page.original_url).await {
                Ok(bytes) if !bytes.is_empty() => bytes,
                Ok(_) => {
                    outcome.failed += 1;
                    warn!(url = %page.original_url, "Empty response, skipping image");
                    continue;
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(url = %page.original_url, error = %e, "Download failed, skipping image");
                    continue;
                }
            };

            self.store
                .persist(&path, &bytes)
                .await
                .map_err(|source| SyncError::Persist {
                    entry_id: entry.id,
                    path: path.clone(),
                    source,
                })?;

            outcome.downloaded += 1;
            outcome.satisfied += 1;
            let progress = format!("{}/{}", outcome.satisfied, entry.page_count);
            info!(%file, %progress, bytes = bytes.len(), "Downloaded");
        }

        if outcome.satisfied >= entry.page_count || unavailable {
            outcome.migration = self.migrate(entry.id, unavailable).await?;
        } else {
            warn!(
                satisfied = outcome.satisfied,
                expected = entry.page_count,
                "Entry incomplete, leaving it in the public collection"
            );
        }

        Ok(outcome)
    }

    /// Remove from the public collection, then re-add privately unless unavailable
    async fn migrate(&self, entry_id: u64, unavailable: bool) -> Result<Migration, SyncError> {
        let status = self
            .client
            .remove_from_collection(entry_id)
            .await
            .map_err(|source| SyncError::Removal { entry_id, source })?;
        if status != SUCCESS_STATUS {
            return Err(SyncError::Rejected {
                entry_id,
                action: "Removal",
                status,
            });
        }

        if unavailable {
            info!("Entry no longer available at the source, removed without archiving");
            return Ok(Migration::RemovedUnavailable);
        }

        let tags = [self.settings.completed_tag.clone()];
        let status = self
            .client
            .add_to_collection(entry_id, Visibility::Private, "", &tags)
            .await
            .map_err(|source| SyncError::Addition { entry_id, source })?;
        if status != SUCCESS_STATUS {
            return Err(SyncError::Rejected {
                entry_id,
                action: "Addition",
                status,
            });
        }

        info!(tag = %self.settings.completed_tag, "Archived to private collection");
        Ok(Migration::Archived)
    }
}
