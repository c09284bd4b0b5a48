//! Draining traversal of the remote collection.
//!
//! Every request asks for the first `page_size` entries. Entries that are
//! fully processed get migrated out of the public collection, so repeating
//! the same request surfaces the next batch. Offsets would skip entries here,
//! which is also why entries are processed strictly one after another.

use tracing::{info, instrument, warn};

use super::error::SyncError;
use super::processor::ItemProcessor;
use crate::adapters::CollectionClient;
use crate::config::CollectionQuery;
use crate::domain::{Migration, SyncReport};

/// Requests collection pages and feeds their entries to the processor
pub struct PaginationDriver<'a> {
    client: &'a dyn CollectionClient,
    processor: ItemProcessor<'a>,
    query: CollectionQuery,
}

impl<'a> PaginationDriver<'a> {
    pub fn new(client: &'a dyn CollectionClient, processor: ItemProcessor<'a>, query: CollectionQuery) -> Self {
        Self {
            client,
            processor,
            query,
        }
    }

    /// Process one page; `Ok(true)` means more entries remain.
    ///
    /// The first failing entry aborts the page. An error always implies that
    /// the traversal should be attempted again.
    #[instrument(skip(self, report), fields(page = report.pages + 1))]
    pub async fn drain_page(&self, report: &mut SyncReport) -> Result<bool, SyncError> {
        let page = self
            .client
            .list_collection(
                &self.query.tag,
                self.query.visibility,
                0,
                self.query.page_size,
            )
            .await
            .map_err(|source| SyncError::Listing { source })?;

        info!(
            entries = page.entries.len(),
            total = page.total,
            "Fetched collection page"
        );

        if page.entries.is_empty() {
            if page.total > 0 {
                warn!(total = page.total, "Collection reports entries but returned none; stopping");
            }
            return Ok(false);
        }

        let mut migrated = 0;
        for entry in &page.entries {
            let outcome = self.processor.process(entry).await?;
            if outcome.migration != Migration::Deferred {
                migrated += 1;
            }
            report.record_entry(&outcome);
        }

        report.pages += 1;
        let has_more = page.total > u64::from(self.query.page_size);
        if has_more && migrated == 0 {
            warn!(
                entries = page.entries.len(),
                "No entry on this page could be migrated; the next request returns the same page"
            );
        }
        Ok(has_more)
    }

    /// Drain pages until the collection reports nothing beyond the current page
    pub async fn traverse(&self, report: &mut SyncReport) -> Result<(), SyncError> {
        let mut has_more = true;
        while has_more {
            has_more = self.drain_page(report).await?;
        }
        Ok(())
    }
}
