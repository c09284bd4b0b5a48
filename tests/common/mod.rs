//! In-memory stand-ins for the remote service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use pixiv_hunter::adapters::{CollectionClient, CollectionPage, MediaFetcher, Visibility};
use pixiv_hunter::config::{RetrySettings, Settings};
use pixiv_hunter::domain::{CatalogEntry, MediaPage};

pub const DONE_TAG: &str = "done";

/// Settings with a recognizable completion tag
pub fn test_settings() -> Settings {
    Settings {
        completed_tag: DONE_TAG.to_string(),
        ..Default::default()
    }
}

/// Retry policy that keeps tests fast
pub fn fast_retry(cooldown_ms: u64, max_attempts: Option<u32>) -> RetrySettings {
    RetrySettings {
        cooldown: Duration::from_millis(cooldown_ms),
        heartbeat: Duration::from_millis(10),
        max_attempts,
    }
}

pub fn entry(id: u64, title: &str, tags: &[&str], page_count: u32) -> CatalogEntry {
    CatalogEntry {
        id,
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author: "painter".to_string(),
        page_count,
    }
}

pub fn image_url(id: u64, index: u32) -> String {
    format!("https://i.pximg.net/img-original/img/{}_p{}.png", id, index)
}

pub fn media_pages(id: u64, count: u32) -> Vec<MediaPage> {
    (0..count).map(|i| MediaPage::new(i, image_url(id, i))).collect()
}

#[derive(Default)]
struct CollectionState {
    public: Vec<CatalogEntry>,
    pages: HashMap<u64, Vec<MediaPage>>,
    archived: Vec<(u64, Visibility, Vec<String>)>,
    removed: Vec<u64>,
    list_calls: u32,
    detail_calls: Vec<u64>,
    listing_failures: u32,
    detail_failures: HashMap<u64, u32>,
    removal_status: Option<String>,
}

/// Public collection that shrinks as entries are removed
#[derive(Default)]
pub struct FakeCollection {
    state: Mutex<CollectionState>,
}

impl FakeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry whose media pages are `page_count` PNG URLs
    pub fn with_entry(self, entry: CatalogEntry) -> Self {
        let pages = media_pages(entry.id, entry.page_count);
        self.with_entry_pages(entry, pages)
    }

    pub fn with_entry_pages(self, entry: CatalogEntry, pages: Vec<MediaPage>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.pages.insert(entry.id, pages);
            state.public.push(entry);
        }
        self
    }

    /// Fail the next `times` listing requests
    pub fn fail_listing(self, times: u32) -> Self {
        self.state.lock().unwrap().listing_failures = times;
        self
    }

    /// Fail the next `times` detail requests for `entry_id`
    pub fn fail_detail(self, entry_id: u64, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .detail_failures
            .insert(entry_id, times);
        self
    }

    /// Answer removals with this status instead of "success"
    pub fn removal_status(self, status: &str) -> Self {
        self.state.lock().unwrap().removal_status = Some(status.to_string());
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.state.lock().unwrap().list_calls
    }

    pub fn detail_calls(&self) -> Vec<u64> {
        self.state.lock().unwrap().detail_calls.clone()
    }

    pub fn removed(&self) -> Vec<u64> {
        self.state.lock().unwrap().removed.clone()
    }

    pub fn archived(&self) -> Vec<(u64, Visibility, Vec<String>)> {
        self.state.lock().unwrap().archived.clone()
    }

    pub fn public_len(&self) -> usize {
        self.state.lock().unwrap().public.len()
    }
}

#[async_trait]
impl CollectionClient for FakeCollection {
    async fn authenticate(&self, _session: &str) -> Result<String> {
        Ok("tester (1)".to_string())
    }

    async fn list_collection(
        &self,
        _tag: &str,
        _visibility: Visibility,
        offset: u32,
        limit: u32,
    ) -> Result<CollectionPage> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        if state.listing_failures > 0 {
            state.listing_failures -= 1;
            anyhow::bail!("connection reset by peer");
        }

        let entries = state
            .public
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(CollectionPage {
            entries,
            total: state.public.len() as u64,
        })
    }

    async fn get_media_pages(&self, entry_id: u64) -> Result<Vec<MediaPage>> {
        let mut state = self.state.lock().unwrap();
        state.detail_calls.push(entry_id);

        if let Some(remaining) = state.detail_failures.get_mut(&entry_id) {
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("timed out loading entry {}", entry_id);
            }
        }

        Ok(state.pages.get(&entry_id).cloned().unwrap_or_default())
    }

    async fn remove_from_collection(&self, entry_id: u64) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.removal_status.clone() {
            return Ok(status);
        }

        state.public.retain(|e| e.id != entry_id);
        state.removed.push(entry_id);
        Ok("success".to_string())
    }

    async fn add_to_collection(
        &self,
        entry_id: u64,
        visibility: Visibility,
        _comment: &str,
        tags: &[String],
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.archived.push((entry_id, visibility, tags.to_vec()));
        Ok("success".to_string())
    }
}

/// Serves the URL itself as image bytes, except for URLs marked as broken
#[derive(Default)]
pub struct FakeFetcher {
    calls: Mutex<Vec<String>>,
    broken: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken(self, url: impl Into<String>) -> Self {
        self.broken.lock().unwrap().push(url.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.broken.lock().unwrap().iter().any(|u| u == url) {
            anyhow::bail!("403 Forbidden");
        }

        Ok(url.as_bytes().to_vec())
    }
}
