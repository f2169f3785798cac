//! Storefront review endpoints: lifetime summary and monthly histogram.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use reqwest::Url;

use steamsync_core::{HistogramEntry, ReviewSummary};

use crate::error::SourceError;
use crate::http::{decode_json, join_path, parse_base_url, HttpFetcher};
use crate::outcome::FetchOutcome;
use crate::parse::month_start;
use crate::rate_limit::RateLimiter;
use crate::types::{HistogramResponse, HistogramRollup, ReviewsResponse};

const DEFAULT_BASE_URL: &str = "https://store.steampowered.com/";

pub struct ReviewsClient {
    fetcher: HttpFetcher,
    summary_limiter: Arc<RateLimiter>,
    histogram_limiter: Arc<RateLimiter>,
    base_url: Url,
}

impl ReviewsClient {
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] only if the built-in base URL
    /// fails to parse.
    pub fn new(
        fetcher: HttpFetcher,
        summary_limiter: Arc<RateLimiter>,
        histogram_limiter: Arc<RateLimiter>,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(fetcher, summary_limiter, histogram_limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        fetcher: HttpFetcher,
        summary_limiter: Arc<RateLimiter>,
        histogram_limiter: Arc<RateLimiter>,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            fetcher,
            summary_limiter,
            histogram_limiter,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Lifetime review totals. Apps with no reviews, or that the endpoint
    /// refuses, are `NoData`.
    ///
    /// # Errors
    ///
    /// Transport, status and decode errors from the underlying request.
    pub async fn fetch_summary(&self, appid: i32) -> Result<FetchOutcome<ReviewSummary>, SourceError> {
        let mut url = join_path(&self.base_url, &format!("appreviews/{appid}"))?;
        url.query_pairs_mut()
            .append_pair("json", "1")
            .append_pair("language", "all")
            .append_pair("purchase_type", "all")
            .append_pair("num_per_page", "0");

        let fetched = self.fetcher.get(&self.summary_limiter, &url).await?;
        let response: ReviewsResponse = decode_json(&fetched.body, "review summary")?;

        if response.success != 1 {
            return Ok(FetchOutcome::no_data(format!(
                "review summary unavailable for app {appid}"
            )));
        }
        let Some(summary) = response.query_summary else {
            return Ok(FetchOutcome::no_data(format!(
                "review summary missing for app {appid}"
            )));
        };
        if summary.total_reviews == 0 {
            return Ok(FetchOutcome::no_data(format!("app {appid} has no reviews")));
        }

        Ok(FetchOutcome::Data(ReviewSummary {
            appid,
            total_positive: summary.total_positive,
            total_negative: summary.total_negative,
            total_reviews: summary.total_reviews,
            review_score: summary.review_score,
            review_score_desc: summary.review_score_desc,
        }))
    }

    /// Monthly recommendation buckets, oldest first. An empty history is
    /// `NoData`.
    ///
    /// # Errors
    ///
    /// Transport, status and decode errors from the underlying request.
    pub async fn fetch_histogram(
        &self,
        appid: i32,
    ) -> Result<FetchOutcome<Vec<HistogramEntry>>, SourceError> {
        let mut url = join_path(&self.base_url, &format!("appreviewhistogram/{appid}"))?;
        url.query_pairs_mut()
            .append_pair("l", "english")
            .append_pair("review_score_preference", "0");

        let fetched = self.fetcher.get(&self.histogram_limiter, &url).await?;
        let response: HistogramResponse = decode_json(&fetched.body, "review histogram")?;

        let rollups = match response.results {
            Some(results) if response.success == 1 => results.rollups,
            _ => {
                return Ok(FetchOutcome::no_data(format!(
                    "review histogram unavailable for app {appid}"
                )))
            }
        };

        let entries = bucket_by_month(&rollups);
        if entries.is_empty() {
            return Ok(FetchOutcome::no_data(format!(
                "app {appid} has no review history"
            )));
        }
        Ok(FetchOutcome::Data(entries))
    }
}

/// Maps unix-timestamp rollups onto calendar months, merging any two rollups
/// that land in the same month.
fn bucket_by_month(rollups: &[HistogramRollup]) -> Vec<HistogramEntry> {
    let mut months: BTreeMap<NaiveDate, (i32, i32)> = BTreeMap::new();
    for rollup in rollups {
        let Some(at) = DateTime::from_timestamp(rollup.date, 0) else {
            continue;
        };
        let slot = months.entry(month_start(at.date_naive())).or_default();
        slot.0 = slot.0.saturating_add(rollup.recommendations_up);
        slot.1 = slot.1.saturating_add(rollup.recommendations_down);
    }

    months
        .into_iter()
        .map(|(month_start, (up, down))| HistogramEntry {
            month_start,
            recommendations_up: up,
            recommendations_down: down,
        })
        .collect()
}
