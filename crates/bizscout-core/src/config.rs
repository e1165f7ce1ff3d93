use crate::app_config::{AppConfig, Environment};
use crate::item::Coordinate;
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
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
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

    let api_key = require("BIZSCOUT_API_KEY")?;
    let env = parse_environment(&or_default("BIZSCOUT_ENV", "development"))?;
    let log_level = or_default("BIZSCOUT_LOG_LEVEL", "info");
    let api_base_url = or_default("BIZSCOUT_API_BASE_URL", "https://api.yelp.com/v2/");

    let request_timeout_secs = parse_u64("BIZSCOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("BIZSCOUT_USER_AGENT", "bizscout/0.1 (listing-browser)");
    let max_retries = parse_u32("BIZSCOUT_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("BIZSCOUT_RETRY_BACKOFF_BASE_MS", "500")?;

    let page_limit = parse_u32("BIZSCOUT_PAGE_LIMIT", "20")?;
    if page_limit == 0 {
        return Err(invalid(
            "BIZSCOUT_PAGE_LIMIT",
            "must be greater than zero".to_string(),
        ));
    }

    let default_term = or_default("BIZSCOUT_DEFAULT_TERM", "Restaurants");
    let default_location = or_default("BIZSCOUT_DEFAULT_LOCATION", "37.7838,-122.3875")
        .parse::<Coordinate>()
        .map_err(|reason| invalid("BIZSCOUT_DEFAULT_LOCATION", reason))?;

    Ok(AppConfig {
        api_key,
        env,
        log_level,
        api_base_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        page_limit,
        default_term,
        default_location,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BIZSCOUT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
