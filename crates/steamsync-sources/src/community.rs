//! Steam Community app hub scrape for an early "page created" date.
//!
//! The hub has no API. The earliest date printed on the page (announcements,
//! review and discussion timestamps) is used as a lower bound for when the
//! store page went live.

use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use reqwest::Url;

use crate::error::SourceError;
use crate::http::{join_path, parse_base_url, HttpFetcher};
use crate::outcome::FetchOutcome;
use crate::parse::parse_release_date;
use crate::rate_limit::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://steamcommunity.com/";

static DATE_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}|\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*,?\s+\d{4}|\d{4}-\d{2}-\d{2})\b",
    )
    .expect("valid regex")
});

pub struct CommunityClient {
    fetcher: HttpFetcher,
    limiter: Arc<RateLimiter>,
    base_url: Url,
}

impl CommunityClient {
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
        Ok(Self {
            fetcher,
            limiter,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Scrapes the app hub for the earliest date it shows.
    ///
    /// A page that loads but carries no recognisable date is still a
    /// successful scrape: `Data(None)`. A missing hub (404, or a redirect
    /// away from the app's page) is `NoData`.
    ///
    /// # Errors
    ///
    /// Transport errors and non-404 unexpected statuses.
    pub async fn fetch_page_creation_date(
        &self,
        appid: i32,
    ) -> Result<FetchOutcome<Option<NaiveDate>>, SourceError> {
        let app_path = format!("app/{appid}");
        let url = join_path(&self.base_url, &app_path)?;

        let fetched = match self.fetcher.get(&self.limiter, &url).await {
            Ok(fetched) => fetched,
            Err(SourceError::UnexpectedStatus { status: 404, .. }) => {
                return Ok(FetchOutcome::no_data(format!(
                    "community hub not found for app {appid}"
                )));
            }
            Err(e) => return Err(e),
        };

        if !fetched.url.path().trim_end_matches('/').ends_with(&app_path) {
            return Ok(FetchOutcome::no_data(format!(
                "community hub for app {appid} redirected to {}",
                fetched.url.path()
            )));
        }

        Ok(FetchOutcome::Data(earliest_date(&fetched.body)))
    }
}

/// Earliest parseable date-like text in `html`.
#[must_use]
pub fn earliest_date(html: &str) -> Option<NaiveDate> {
    DATE_HINT_RE
        .find_iter(html)
        .filter_map(|m| parse_release_date(&m.as_str().replace('.', "")))
        .min()
}
