use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_multiplier = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 1.0 {
            return Err(invalid(var, format!("must be a finite number >= 1, got {value}")));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("STEAMSYNC_ENV", "development"));
    let log_level = or_default("STEAMSYNC_LOG_LEVEL", "info");
    let steam_api_key = lookup("STEAM_API_KEY").ok().filter(|k| !k.trim().is_empty());

    let db_max_connections = parse_u32("STEAMSYNC_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("STEAMSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STEAMSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_timeout_secs = parse_u64("STEAMSYNC_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("STEAMSYNC_USER_AGENT", "steamsync/0.1 (game-data-pipeline)");
    let max_retries = parse_u32("STEAMSYNC_MAX_RETRIES", "3")?;
    let retry_initial_delay_ms = parse_u64("STEAMSYNC_RETRY_INITIAL_DELAY_MS", "1000")?;
    let retry_max_delay_ms = parse_u64("STEAMSYNC_RETRY_MAX_DELAY_MS", "30000")?;
    let retry_backoff_multiplier = parse_multiplier("STEAMSYNC_RETRY_BACKOFF_MULTIPLIER", "2.0")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        steam_api_key,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        user_agent,
        max_retries,
        retry_initial_delay_ms,
        retry_max_delay_ms,
        retry_backoff_multiplier,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
