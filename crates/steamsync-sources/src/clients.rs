//! Process-wide bundle of source clients.
//!
//! Built once by the binary so that every call site hitting the same
//! endpoint family shares one [`RateLimiter`].

use std::sync::Arc;

use crate::catalog::CatalogClient;
use crate::community::CommunityClient;
use crate::error::SourceError;
use crate::http::{ClientSettings, HttpFetcher};
use crate::rate_limit::{RateLimiter, RateLimits};
use crate::reviews::ReviewsClient;
use crate::steamspy::SteamSpyClient;
use crate::storefront::StorefrontClient;

pub struct SteamClients {
    pub catalog: CatalogClient,
    pub steamspy: SteamSpyClient,
    pub storefront: StorefrontClient,
    pub reviews: ReviewsClient,
    pub community: CommunityClient,
}

impl SteamClients {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: &ClientSettings,
        limits: &RateLimits,
        steam_api_key: Option<String>,
    ) -> Result<Self, SourceError> {
        let fetcher = HttpFetcher::new(settings)?;
        let limiter = |name: &'static str, config| Arc::new(RateLimiter::from_config(name, config));

        Ok(Self {
            catalog: CatalogClient::new(
                fetcher.clone(),
                limiter("catalog", limits.catalog),
                steam_api_key,
            )?,
            steamspy: SteamSpyClient::new(
                fetcher.clone(),
                limiter("steamspy", limits.steamspy_single),
                limiter("steamspy-all", limits.steamspy_bulk),
            )?,
            storefront: StorefrontClient::new(
                fetcher.clone(),
                limiter("storefront", limits.storefront),
            )?,
            reviews: ReviewsClient::new(
                fetcher.clone(),
                limiter("reviews", limits.review_summary),
                limiter("review-histogram", limits.review_histogram),
            )?,
            community: CommunityClient::new(fetcher, limiter("community", limits.community))?,
        })
    }
}
