mod app_config;
mod config;
pub mod records;
pub mod sync;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    AppStats, CatalogEntry, HistogramEntry, OwnersRange, PlatformFlags, PriceUpdate,
    ReviewSummary, StorefrontDetails,
};
pub use sync::{JobCompletion, JobStatus, JobType, SyncCounters, SyncSource};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
