//! `SteamSpy` aggregated ownership, playtime and review stats.
//!
//! Two endpoint families with very different budgets: `appdetails` for one
//! app (1 req/s) and `all` for a 1000-app page (1 req/min). Each has its own
//! limiter.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;

use steamsync_core::AppStats;

use crate::error::SourceError;
use crate::http::{decode_json, join_path, parse_base_url, HttpFetcher};
use crate::outcome::FetchOutcome;
use crate::parse::parse_owners;
use crate::rate_limit::RateLimiter;
use crate::types::SteamSpyApp;

const DEFAULT_BASE_URL: &str = "https://steamspy.com/";
const API_PATH: &str = "api.php";

/// Page cap for the `all` walk. The catalog is well under 100 000 apps with
/// public stats.
pub const DEFAULT_MAX_PAGES: u32 = 100;

pub struct SteamSpyClient {
    fetcher: HttpFetcher,
    single: Arc<RateLimiter>,
    bulk: Arc<RateLimiter>,
    endpoint: Url,
}

impl SteamSpyClient {
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] only if the built-in base URL
    /// fails to parse.
    pub fn new(
        fetcher: HttpFetcher,
        single: Arc<RateLimiter>,
        bulk: Arc<RateLimiter>,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(fetcher, single, bulk, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        fetcher: HttpFetcher,
        single: Arc<RateLimiter>,
        bulk: Arc<RateLimiter>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let endpoint = join_path(&parse_base_url(base_url)?, API_PATH)?;
        Ok(Self {
            fetcher,
            single,
            bulk,
            endpoint,
        })
    }

    /// Stats for one app. An unknown appid comes back as `NoData`.
    ///
    /// # Errors
    ///
    /// Transport, status and decode errors from the underlying request.
    pub async fn fetch_app(&self, appid: i32) -> Result<FetchOutcome<AppStats>, SourceError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("request", "appdetails")
            .append_pair("appid", &appid.to_string());

        let fetched = self.fetcher.get(&self.single, &url).await?;
        let raw: SteamSpyApp = decode_json(&fetched.body, "steamspy appdetails")?;

        Ok(match to_app_stats(raw, appid) {
            Some(stats) => FetchOutcome::Data(stats),
            None => FetchOutcome::no_data(format!("steamspy has no data for app {appid}")),
        })
    }

    /// One page of the `all` listing, sorted by appid.
    ///
    /// An empty or unparseable body means the page index ran past the end of
    /// the catalog and yields an empty page rather than an error.
    ///
    /// # Errors
    ///
    /// Transport and status errors from the underlying request.
    pub async fn fetch_all_page(&self, page: u32) -> Result<Vec<AppStats>, SourceError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("request", "all")
            .append_pair("page", &page.to_string());

        let fetched = self.fetcher.get(&self.bulk, &url).await?;
        let body = fetched.body.trim();
        if body.is_empty() {
            return Ok(Vec::new());
        }

        let raw: HashMap<String, SteamSpyApp> = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(page, error = %e, "unparseable steamspy page; treating as end of pages");
                return Ok(Vec::new());
            }
        };

        let mut stats: Vec<AppStats> = raw
            .into_iter()
            .filter_map(|(key, app)| {
                let fallback = key.parse::<i32>().unwrap_or(app.appid);
                to_app_stats(app, fallback)
            })
            .collect();
        stats.sort_by_key(|s| s.appid);
        Ok(stats)
    }
}

/// Normalizes a raw `SteamSpy` record. Returns `None` for the placeholder
/// object `SteamSpy` sends for unknown apps (no name).
fn to_app_stats(raw: SteamSpyApp, fallback_appid: i32) -> Option<AppStats> {
    let name = raw.name?;
    let appid = if raw.appid > 0 { raw.appid } else { fallback_appid };

    Some(AppStats {
        appid,
        name,
        developer: raw.developer,
        publisher: raw.publisher,
        owners: raw.owners.as_deref().map(parse_owners).unwrap_or_default(),
        average_playtime_forever: raw.average_forever,
        average_playtime_2weeks: raw.average_2weeks,
        median_playtime_forever: raw.median_forever,
        median_playtime_2weeks: raw.median_2weeks,
        positive: raw.positive,
        negative: raw.negative,
        price_cents: raw.price,
        initial_price_cents: raw.initialprice,
        discount_percent: raw.discount,
        ccu: raw.ccu,
    })
}
