//! Full Steam app list via `IStoreService/GetAppList`.

use std::sync::Arc;

use chrono::DateTime;
use reqwest::Url;

use steamsync_core::CatalogEntry;

use crate::error::SourceError;
use crate::http::{decode_json, join_path, parse_base_url, HttpFetcher};
use crate::outcome::FetchOutcome;
use crate::rate_limit::RateLimiter;
use crate::types::AppListEnvelope;

const DEFAULT_BASE_URL: &str = "https://api.steampowered.com/";
const APP_LIST_PATH: &str = "IStoreService/GetAppList/v1/";

/// Apps requested per page. The endpoint caps this at 50 000.
const PAGE_SIZE: u32 = 50_000;

/// Page cap for [`CatalogClient::fetch_all`]. Guards against a cursor that
/// never advances.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// One page of the app list plus the cursor for the next.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub last_appid: Option<i64>,
    pub have_more_results: bool,
}

/// Client for the keyed Steam Web API app list.
pub struct CatalogClient {
    fetcher: HttpFetcher,
    limiter: Arc<RateLimiter>,
    base_url: Url,
    api_key: Option<String>,
}

impl CatalogClient {
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] only if the built-in base URL
    /// fails to parse.
    pub fn new(
        fetcher: HttpFetcher,
        limiter: Arc<RateLimiter>,
        api_key: Option<String>,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(fetcher, limiter, api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        fetcher: HttpFetcher,
        limiter: Arc<RateLimiter>,
        api_key: Option<String>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            fetcher,
            limiter,
            base_url: parse_base_url(base_url)?,
            api_key,
        })
    }

    /// Fetches the page of apps following `last_appid` (`None` for the first).
    ///
    /// # Errors
    ///
    /// - [`SourceError::MissingApiKey`] when no Steam API key is configured.
    /// - Transport, status and decode errors from the underlying request.
    pub async fn fetch_page(&self, last_appid: Option<i64>) -> Result<CatalogPage, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey {
                source_name: "catalog",
            })?;

        let mut url = join_path(&self.base_url, APP_LIST_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("key", api_key)
                .append_pair("max_results", &PAGE_SIZE.to_string())
                .append_pair("include_games", "true");
            if let Some(last) = last_appid {
                query.append_pair("last_appid", &last.to_string());
            }
        }

        let fetched = self.fetcher.get(&self.limiter, &url).await?;
        let envelope: AppListEnvelope = decode_json(&fetched.body, "catalog app list")?;
        let response = envelope.response;

        let entries = response
            .apps
            .into_iter()
            .filter_map(|item| {
                let appid = i32::try_from(item.appid).ok()?;
                Some(CatalogEntry {
                    appid,
                    name: item.name,
                    last_modified: item
                        .last_modified
                        .and_then(|secs| DateTime::from_timestamp(secs, 0)),
                })
            })
            .collect();

        Ok(CatalogPage {
            entries,
            last_appid: response.last_appid,
            have_more_results: response.have_more_results,
        })
    }

    /// Walks the app list until the upstream reports no more results, a page
    /// comes back empty, or `max_pages` pages have been read.
    ///
    /// Returns `NoData` if the catalog is empty.
    ///
    /// A later page whose body is empty or does not decode ends the walk and
    /// keeps what was already read.
    ///
    /// # Errors
    ///
    /// Propagates an undecodable first page and any transport or status
    /// error; pages already read are discarded in that case.
    pub async fn fetch_all(
        &self,
        max_pages: u32,
    ) -> Result<FetchOutcome<Vec<CatalogEntry>>, SourceError> {
        let mut all = Vec::new();
        let mut cursor = None;

        for page_number in 1..=max_pages {
            let page = match self.fetch_page(cursor).await {
                Ok(page) => page,
                Err(SourceError::Deserialize { source, .. }) if !all.is_empty() => {
                    tracing::debug!(
                        page = page_number,
                        total = all.len(),
                        error = %source,
                        "unparseable catalog page; treating as end of pages"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            let count = page.entries.len();
            all.extend(page.entries);

            tracing::debug!(page = page_number, count, total = all.len(), "fetched catalog page");

            if count == 0 || !page.have_more_results {
                break;
            }
            match page.last_appid {
                Some(next) if Some(next) != cursor => cursor = Some(next),
                _ => break,
            }
            if page_number == max_pages {
                tracing::warn!(max_pages, "catalog page cap reached; list may be truncated");
            }
        }

        if all.is_empty() {
            return Ok(FetchOutcome::no_data("catalog returned no apps"));
        }
        Ok(FetchOutcome::Data(all))
    }
}
