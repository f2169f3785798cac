//! Raw upstream response shapes.
//!
//! ## Observed quirks
//!
//! ### `SteamSpy`
//! Numbers arrive as JSON numbers or numeric strings depending on the field
//! (`price`, `initialprice` and `discount` are strings, `"0"` for free apps).
//! An unknown appid still returns `200` with an object whose `name` is empty
//! or `null`. The `all` request returns an object keyed by appid, or an empty
//! body / HTML error page once the page index runs past the catalog.
//!
//! ### Storefront `appdetails`
//! The response is keyed by the requested appid as a string:
//! `{"730": {"success": true, "data": {...}}}`. With
//! `filters=price_overview`, `data` is an empty *array* for free apps rather
//! than an object, so it is modelled as a raw [`serde_json::Value`].
//!
//! ### Reviews
//! `success` is the integer `1`, not a boolean.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::parse::{lenient_i32, lenient_price_cents, lenient_string};

// ---------------------------------------------------------------------------
// Catalog: IStoreService/GetAppList
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AppListEnvelope {
    #[serde(default)]
    pub response: AppListResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppListResponse {
    #[serde(default)]
    pub apps: Vec<AppListItem>,
    #[serde(default)]
    pub have_more_results: bool,
    #[serde(default)]
    pub last_appid: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AppListItem {
    pub appid: i64,
    #[serde(default)]
    pub name: String,
    /// Unix seconds.
    #[serde(default)]
    pub last_modified: Option<i64>,
}

// ---------------------------------------------------------------------------
// SteamSpy
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SteamSpyApp {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub appid: i32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub developer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owners: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub positive: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub negative: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub average_forever: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub average_2weeks: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub median_forever: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub median_2weeks: i32,
    #[serde(default, deserialize_with = "lenient_price_cents")]
    pub price: Option<i32>,
    #[serde(default, deserialize_with = "lenient_price_cents")]
    pub initialprice: Option<i32>,
    #[serde(default, deserialize_with = "lenient_price_cents")]
    pub discount: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub ccu: i32,
}

// ---------------------------------------------------------------------------
// Storefront
// ---------------------------------------------------------------------------

/// One entry of the appid-keyed `appdetails` response.
#[derive(Debug, Deserialize)]
pub struct StoreEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

pub type StoreResponse = HashMap<String, StoreEnvelope>;

#[derive(Debug, Deserialize)]
pub struct StoreAppData {
    #[serde(rename = "type", default)]
    pub app_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub price_overview: Option<StorePriceOverview>,
    #[serde(default)]
    pub platforms: Option<StorePlatforms>,
    #[serde(default)]
    pub metacritic: Option<StoreMetacritic>,
    #[serde(default)]
    pub categories: Vec<StoreTag>,
    #[serde(default)]
    pub genres: Vec<StoreTag>,
    #[serde(default)]
    pub release_date: Option<StoreReleaseDate>,
    #[serde(default)]
    pub controller_support: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StorePriceOverview {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub initial: i32,
    #[serde(rename = "final", default, deserialize_with = "lenient_i32")]
    pub final_price: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub discount_percent: i32,
}

/// `data` payload under `filters=price_overview`.
#[derive(Debug, Deserialize)]
pub struct StorePriceOnly {
    #[serde(default)]
    pub price_overview: Option<StorePriceOverview>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorePlatforms {
    #[serde(default)]
    pub windows: bool,
    #[serde(default)]
    pub mac: bool,
    #[serde(default)]
    pub linux: bool,
}

#[derive(Debug, Deserialize)]
pub struct StoreMetacritic {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub score: i32,
}

/// Category or genre. Genre ids are strings upstream, category ids numbers.
#[derive(Debug, Deserialize)]
pub struct StoreTag {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreReleaseDate {
    #[serde(default)]
    pub coming_soon: bool,
    #[serde(default)]
    pub date: String,
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReviewsResponse {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub success: i32,
    #[serde(default)]
    pub query_summary: Option<ReviewQuerySummary>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuerySummary {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub review_score: i32,
    #[serde(default)]
    pub review_score_desc: String,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub total_positive: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub total_negative: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub total_reviews: i32,
}

#[derive(Debug, Deserialize)]
pub struct HistogramResponse {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub success: i32,
    #[serde(default)]
    pub results: Option<HistogramResults>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramResults {
    #[serde(default)]
    pub rollups: Vec<HistogramRollup>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramRollup {
    /// Unix seconds at the start of the bucket.
    pub date: i64,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub recommendations_up: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub recommendations_down: i32,
}
