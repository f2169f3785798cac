//! Normalized per-source records.
//!
//! Each source client parses its upstream payload into one of these shapes.
//! They are transient: built per call and consumed immediately by a worker.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Estimated owner count bucket, e.g. `"10,000,000 .. 20,000,000"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnersRange {
    pub min: i64,
    pub max: i64,
}

impl OwnersRange {
    #[must_use]
    pub fn midpoint(&self) -> i64 {
        self.min + (self.max - self.min) / 2
    }
}

/// One entry from the full Steam app list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub appid: i32,
    pub name: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Aggregated ownership, playtime, review and price stats for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStats {
    pub appid: i32,
    pub name: String,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub owners: OwnersRange,
    /// Minutes.
    pub average_playtime_forever: i32,
    pub average_playtime_2weeks: i32,
    pub median_playtime_forever: i32,
    pub median_playtime_2weeks: i32,
    pub positive: i32,
    pub negative: i32,
    pub price_cents: Option<i32>,
    pub initial_price_cents: Option<i32>,
    pub discount_percent: Option<i32>,
    /// Peak concurrent users yesterday.
    pub ccu: i32,
}

impl AppStats {
    /// Scheduling priority derived from popularity. The scheduler maps scores
    /// of 100, 50 and 10 onto daily, 3-day and weekly refresh; anything lower
    /// refreshes monthly.
    #[must_use]
    pub fn priority_score(&self) -> i32 {
        let reviews = i64::from(self.positive) + i64::from(self.negative);
        if self.ccu >= 1_000 || self.owners.max >= 10_000_000 {
            100
        } else if self.ccu >= 100 || self.owners.max >= 1_000_000 || reviews >= 10_000 {
            50
        } else if self.ccu >= 1 || self.owners.max >= 100_000 || reviews >= 100 {
            10
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFlags {
    pub windows: bool,
    pub mac: bool,
    pub linux: bool,
}

/// Store page detail for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontDetails {
    pub appid: i32,
    pub name: String,
    /// `"game"`, `"dlc"`, `"demo"`, ...
    pub app_type: String,
    pub is_free: bool,
    pub release_date: Option<NaiveDate>,
    /// Release date text exactly as the store shows it.
    pub release_date_raw: Option<String>,
    pub coming_soon: bool,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub categories: Vec<String>,
    pub genres: Vec<String>,
    pub platforms: PlatformFlags,
    pub is_workshop_enabled: bool,
    pub price_cents: Option<i32>,
    pub discount_percent: Option<i32>,
    pub metacritic_score: Option<i32>,
    pub controller_support: Option<String>,
}

/// Current price for one app, as returned by the bulk price endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub appid: i32,
    pub price_cents: i32,
    pub discount_percent: i32,
}

/// Lifetime review totals for one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub appid: i32,
    pub total_positive: i32,
    pub total_negative: i32,
    pub total_reviews: i32,
    pub review_score: i32,
    pub review_score_desc: String,
}

impl ReviewSummary {
    /// Share of positive reviews, or `None` when there are no reviews.
    #[must_use]
    pub fn positive_ratio(&self) -> Option<f64> {
        ratio(self.total_positive, self.total_negative)
    }
}

/// One monthly bucket of the review histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramEntry {
    /// First day of the month this bucket covers.
    pub month_start: NaiveDate,
    pub recommendations_up: i32,
    pub recommendations_down: i32,
}

impl HistogramEntry {
    #[must_use]
    pub fn total(&self) -> i64 {
        i64::from(self.recommendations_up) + i64::from(self.recommendations_down)
    }

    #[must_use]
    pub fn positive_ratio(&self) -> Option<f64> {
        ratio(self.recommendations_up, self.recommendations_down)
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(up: i32, down: i32) -> Option<f64> {
    let total = i64::from(up) + i64::from(down);
    if total <= 0 {
        return None;
    }
    Some(i64::from(up) as f64 / total as f64)
}
