//! Steam storefront `appdetails`: full store detail and bulk price lookups.

use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;

use steamsync_core::{PlatformFlags, PriceUpdate, StorefrontDetails};

use crate::error::SourceError;
use crate::http::{decode_json, join_path, parse_base_url, HttpFetcher};
use crate::outcome::FetchOutcome;
use crate::parse::{parse_release_date, value_as_i64};
use crate::rate_limit::RateLimiter;
use crate::types::{StoreAppData, StorePriceOnly, StorePriceOverview, StoreResponse};

const DEFAULT_BASE_URL: &str = "https://store.steampowered.com/";
const APP_DETAILS_PATH: &str = "api/appdetails";

/// Most appids the storefront accepts in one `filters=price_overview` call.
pub const MAX_PRICE_BATCH: usize = 30;

/// Storefront category id for Steam Workshop support.
const WORKSHOP_CATEGORY_ID: i64 = 30;

/// Prices resolved by one bulk lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBatch {
    pub prices: Vec<PriceUpdate>,
    /// Appids the storefront answered `success: false` for.
    pub unavailable: Vec<i32>,
}

pub struct StorefrontClient {
    fetcher: HttpFetcher,
    limiter: Arc<RateLimiter>,
    endpoint: Url,
}

impl StorefrontClient {
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] only if the built-in base URL
    /// fails to parse.
    pub fn new(fetcher: HttpFetcher, limiter: Arc<RateLimiter>) -> Result<Self, SourceError> {
        Self::with_base_url(fetcher, limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        fetcher: HttpFetcher,
        limiter: Arc<RateLimiter>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let endpoint = join_path(&parse_base_url(base_url)?, APP_DETAILS_PATH)?;
        Ok(Self {
            fetcher,
            limiter,
            endpoint,
        })
    }

    /// Full store detail for one app.
    ///
    /// `success: false` is reported as `NoData`. The storefront answers the
    /// same way for delisted apps and for transient refusals, so the two
    /// cannot be told apart here.
    ///
    /// # Errors
    ///
    /// Transport, status and decode errors from the underlying request.
    pub async fn fetch_details(
        &self,
        appid: i32,
    ) -> Result<FetchOutcome<StorefrontDetails>, SourceError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("appids", &appid.to_string())
            .append_pair("cc", "us")
            .append_pair("l", "english");

        let fetched = self.fetcher.get(&self.limiter, &url).await?;
        let mut response: StoreResponse = decode_json(&fetched.body, "storefront appdetails")?;

        let Some(envelope) = response.remove(&appid.to_string()) else {
            return Ok(FetchOutcome::no_data(format!(
                "storefront response has no entry for app {appid}"
            )));
        };
        let data = match envelope.data {
            Some(data) if envelope.success => data,
            _ => {
                return Ok(FetchOutcome::no_data(format!(
                    "storefront reported success=false for app {appid}"
                )))
            }
        };

        let data: StoreAppData = serde_json::from_value(data).map_err(|source| {
            SourceError::Deserialize {
                context: format!("storefront appdetails data for app {appid}"),
                source,
            }
        })?;

        Ok(FetchOutcome::Data(to_details(appid, data)))
    }

    /// Current prices for one sub-batch of at most [`MAX_PRICE_BATCH`] ids,
    /// fetched in a single request. Callers split larger batches.
    ///
    /// Free apps (and apps with no price overview) map to price 0 with no
    /// discount. Apps answered with `success: false` are listed in
    /// [`PriceBatch::unavailable`].
    ///
    /// # Errors
    ///
    /// Transport, status and decode errors from the request.
    pub async fn fetch_prices(&self, appids: &[i32]) -> Result<PriceBatch, SourceError> {
        let mut batch = PriceBatch::default();
        if appids.is_empty() {
            return Ok(batch);
        }

        let joined = appids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("appids", &joined)
            .append_pair("filters", "price_overview")
            .append_pair("cc", "us");

        let fetched = self.fetcher.get(&self.limiter, &url).await?;
        let mut response: StoreResponse = decode_json(&fetched.body, "storefront prices")?;

        for &appid in appids {
            match response.remove(&appid.to_string()) {
                Some(envelope) if envelope.success => {
                    batch.prices.push(price_from_data(appid, envelope.data.as_ref()));
                }
                _ => batch.unavailable.push(appid),
            }
        }

        Ok(batch)
    }
}

/// Interprets one `filters=price_overview` payload. An empty array or a
/// missing overview means the app is free.
fn price_from_data(appid: i32, data: Option<&Value>) -> PriceUpdate {
    let overview = data
        .filter(|v| v.is_object())
        .and_then(|v| serde_json::from_value::<StorePriceOnly>(v.clone()).ok())
        .and_then(|p| p.price_overview);

    match overview {
        Some(StorePriceOverview {
            final_price,
            discount_percent,
            ..
        }) => PriceUpdate {
            appid,
            price_cents: final_price,
            discount_percent,
        },
        None => PriceUpdate {
            appid,
            price_cents: 0,
            discount_percent: 0,
        },
    }
}

fn to_details(appid: i32, data: StoreAppData) -> StorefrontDetails {
    let (price_cents, discount_percent) = match (&data.price_overview, data.is_free) {
        (Some(p), _) => (Some(p.final_price), Some(p.discount_percent)),
        (None, true) => (Some(0), Some(0)),
        (None, false) => (None, None),
    };

    let is_workshop_enabled = data
        .categories
        .iter()
        .any(|c| value_as_i64(&c.id) == Some(WORKSHOP_CATEGORY_ID));

    let (release_date, release_date_raw, coming_soon) = match data.release_date {
        Some(rd) => {
            let raw = rd.date.trim().to_owned();
            let parsed = parse_release_date(&raw);
            (parsed, (!raw.is_empty()).then_some(raw), rd.coming_soon)
        }
        None => (None, None, false),
    };

    let platforms = data.platforms.unwrap_or_default();

    StorefrontDetails {
        appid,
        name: data.name,
        app_type: data.app_type,
        is_free: data.is_free,
        release_date,
        release_date_raw,
        coming_soon,
        developers: clean_names(data.developers),
        publishers: clean_names(data.publishers),
        categories: data.categories.into_iter().map(|c| c.description).collect(),
        genres: data.genres.into_iter().map(|g| g.description).collect(),
        platforms: PlatformFlags {
            windows: platforms.windows,
            mac: platforms.mac,
            linux: platforms.linux,
        },
        is_workshop_enabled,
        price_cents,
        discount_percent,
        metacritic_score: data.metacritic.map(|m| m.score),
        controller_support: data.controller_support,
    }
}

/// Trims, drops blanks and de-duplicates developer/publisher names while
/// keeping store order.
fn clean_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if !trimmed.is_empty() && !out.iter().any(|n| n == trimmed) {
            out.push(trimmed.to_owned());
        }
    }
    out
}
