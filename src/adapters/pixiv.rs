//! Pixiv web API adapter.
//!
//! Talks to the same AJAX endpoints the website uses, authenticated with the
//! `PHPSESSID` cookie. Mutation calls additionally need the CSRF token that
//! is embedded in the front page, which is scraped during [`authenticate`].
//!
//! [`authenticate`]: CollectionClient::authenticate

use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{CollectionClient, CollectionPage, MediaFetcher, Visibility, SUCCESS_STATUS};
use crate::config::Settings;
use crate::domain::{CatalogEntry, MediaPage};

/// Production API origin
pub const BASE_URL: &str = "https://www.pixiv.net";

const BROWSER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Pixiv web API client
pub struct PixivClient {
    /// API origin (overridable for tests)
    base_url: String,
    /// Response language
    language: String,
    /// HTTP client
    client: reqwest::Client,
    /// Established session, if any
    session: RwLock<Option<Session>>,
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    user_id: u64,
    csrf_token: Option<String>,
}

/// Envelope every AJAX endpoint wraps its payload in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    error: bool,
    #[serde(default)]
    message: String,
    body: Option<T>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BookmarksBody {
    #[serde(default)]
    works: Vec<Work>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Work {
    #[serde(deserialize_with = "flexible_id")]
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    page_count: u32,
}

impl From<Work> for CatalogEntry {
    fn from(work: Work) -> Self {
        CatalogEntry {
            id: work.id,
            title: work.title,
            tags: work.tags,
            author: work.user_name,
            page_count: work.page_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PageItem {
    urls: PageUrls,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    #[serde(default)]
    original: Option<String>,
}

/// Ids come back as strings from most endpoints and as numbers from a few
fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn csrf_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""token"\s*:\s*"([0-9a-fA-F]+)""#).expect("static regex is valid")
    })
}

/// Pull the CSRF token out of the front page HTML
fn extract_csrf_token(html: &str) -> Option<String> {
    csrf_pattern()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The session cookie is `<user id>_<random>`
fn user_id_from_session(token: &str) -> Result<u64> {
    token
        .split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .context("Session token must start with the numeric user id (<id>_<secret>)")
}

/// Map a mutation response body to a status literal
fn normalize_status(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed == SUCCESS_STATUS {
        return SUCCESS_STATUS.to_string();
    }

    match serde_json::from_str::<ApiResponse<serde_json::Value>>(trimmed) {
        Ok(envelope) if !envelope.error => SUCCESS_STATUS.to_string(),
        Ok(envelope) if !envelope.message.is_empty() => envelope.message,
        _ => trimmed.to_string(),
    }
}

impl PixivClient {
    /// Create a client using the proxy, timeout and language from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static("https://www.pixiv.net/"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout);

        if let Some(ref proxy) = settings.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .with_context(|| format!("Invalid proxy URL: {}", proxy))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: BASE_URL.to_string(),
            language: settings.language.clone(),
            client,
            session: RwLock::new(None),
        })
    }

    /// Point the client at a different origin
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn session(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .context("Not authenticated; call authenticate first")
    }

    fn cookie(session: &Session) -> String {
        format!("PHPSESSID={}", session.token)
    }

    /// GET an AJAX endpoint and unwrap its envelope
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<T> {
        let url = self.api_url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .header(COOKIE, format!("PHPSESSID={}", token))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        let status = response.status();
        let result: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {} ({})", path, status))?;

        if result.error {
            anyhow::bail!("Pixiv API error from {}: {}", path, result.message);
        }

        let body = result
            .body
            .with_context(|| format!("Response from {} has no body", path))?;
        serde_json::from_value(body)
            .with_context(|| format!("Unexpected response shape from {}", path))
    }

    /// POST a mutation and return the raw response body
    async fn post_mutation(&self, request: reqwest::RequestBuilder, session: &Session) -> Result<String> {
        let mut request = request.header(COOKIE, Self::cookie(session));
        if let Some(ref token) = session.csrf_token {
            request = request.header("x-csrf-token", token);
        }

        let response = request.send().await.context("Mutation request failed")?;
        response
            .text()
            .await
            .context("Failed to read mutation response")
    }
}

#[async_trait]
impl CollectionClient for PixivClient {
    async fn authenticate(&self, session: &str) -> Result<String> {
        let user_id = user_id_from_session(session)?;

        let user: UserBody = self
            .get_json(
                &format!("/ajax/user/{}", user_id),
                &[("full", "0".to_string()), ("lang", self.language.clone())],
                session,
            )
            .await
            .context("Failed to load account profile")?;

        let front_page = self
            .client
            .get(self.api_url("/"))
            .header(COOKIE, format!("PHPSESSID={}", session))
            .send()
            .await
            .context("Failed to load front page")?
            .text()
            .await
            .context("Failed to read front page")?;

        let csrf_token = extract_csrf_token(&front_page);
        if csrf_token.is_none() {
            warn!("No CSRF token found on the front page; bookmark changes may be rejected");
        }

        *self.session.write().await = Some(Session {
            token: session.to_string(),
            user_id,
            csrf_token,
        });

        Ok(format!("{} ({})", user.name, user_id))
    }

    async fn list_collection(
        &self,
        tag: &str,
        visibility: Visibility,
        offset: u32,
        limit: u32,
    ) -> Result<CollectionPage> {
        let session = self.session().await?;

        let body: BookmarksBody = self
            .get_json(
                &format!("/ajax/user/{}/illusts/bookmarks", session.user_id),
                &[
                    ("tag", tag.to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                    ("rest", visibility.as_rest().to_string()),
                    ("lang", self.language.clone()),
                ],
                &session.token,
            )
            .await?;

        Ok(CollectionPage {
            entries: body.works.into_iter().map(CatalogEntry::from).collect(),
            total: body.total,
        })
    }

    async fn get_media_pages(&self, entry_id: u64) -> Result<Vec<MediaPage>> {
        let session = self.session().await?;

        let items: Vec<PageItem> = self
            .get_json(
                &format!("/ajax/illust/{}/pages", entry_id),
                &[("lang", self.language.clone())],
                &session.token,
            )
            .await?;

        // Restricted or deleted pages come back with a null original URL
        Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                item.urls
                    .original
                    .map(|url| MediaPage::new(index as u32, url))
            })
            .collect())
    }

    async fn remove_from_collection(&self, entry_id: u64) -> Result<String> {
        let session = self.session().await?;

        let request = self.client.post(self.api_url("/rpc/index.php")).form(&[
            ("mode", "delete_illust_bookmark".to_string()),
            ("illust_id", entry_id.to_string()),
        ]);

        let body = self.post_mutation(request, &session).await?;
        Ok(normalize_status(&body))
    }

    async fn add_to_collection(
        &self,
        entry_id: u64,
        visibility: Visibility,
        comment: &str,
        tags: &[String],
    ) -> Result<String> {
        let session = self.session().await?;

        let request = self
            .client
            .post(self.api_url("/ajax/illusts/bookmarks/add"))
            .json(&serde_json::json!({
                "illust_id": entry_id.to_string(),
                "restrict": visibility.as_restrict(),
                "comment": comment,
                "tags": tags,
            }));

        let body = self.post_mutation(request, &session).await?;
        Ok(normalize_status(&body))
    }
}

#[async_trait]
impl MediaFetcher for PixivClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Server rejected {}", url))?;

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        Ok(bytes.to_vec())
    }
}
