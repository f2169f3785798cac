pub mod catalog;
pub mod clients;
pub mod community;
pub mod error;
pub mod http;
pub mod outcome;
pub mod parse;
pub mod rate_limit;
pub mod retry;
pub mod reviews;
pub mod steamspy;
pub mod storefront;
pub mod trend;
pub mod types;

pub use catalog::{CatalogClient, CatalogPage};
pub use clients::SteamClients;
pub use community::CommunityClient;
pub use error::SourceError;
pub use http::{ClientSettings, FetchedBody, HttpFetcher};
pub use outcome::FetchOutcome;
pub use parse::{parse_owners, parse_release_date};
pub use rate_limit::{RateLimitConfig, RateLimiter, RateLimits};
pub use retry::{is_retryable, with_retry, RetryEvent, RetryOptions};
pub use reviews::ReviewsClient;
pub use steamspy::SteamSpyClient;
pub use storefront::{PriceBatch, StorefrontClient, MAX_PRICE_BATCH};
pub use trend::{analyze_trend, TrendAnalysis, TrendDirection};
