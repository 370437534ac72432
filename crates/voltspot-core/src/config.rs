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
/// Decoupled from the real environment so tests can use a plain `HashMap`.
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

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be a positive number, got {raw}"),
            });
        }
        Ok(value)
    };

    let api_base_url = require("VOLTSPOT_API_BASE_URL")?;
    if api_base_url.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "VOLTSPOT_API_BASE_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let api_token = lookup("VOLTSPOT_API_TOKEN").ok().filter(|t| !t.is_empty());

    let env = parse_environment(&or_default("VOLTSPOT_ENV", "development"))?;
    let log_level = or_default("VOLTSPOT_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("VOLTSPOT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("VOLTSPOT_USER_AGENT", "voltspot/0.1 (station-search)");

    let search_debounce_ms = parse_u64("VOLTSPOT_SEARCH_DEBOUNCE_MS", "500")?;
    let cluster_threshold_px = parse_positive_f64("VOLTSPOT_CLUSTER_THRESHOLD_PX", "50")?;
    let max_radius_km = parse_positive_f64("VOLTSPOT_MAX_RADIUS_KM", "1000")?;
    let fetch_timeout_secs = parse_u64("VOLTSPOT_FETCH_TIMEOUT_SECS", "30")?;

    Ok(AppConfig {
        env,
        api_base_url,
        api_token,
        log_level,
        request_timeout_secs,
        user_agent,
        search_debounce_ms,
        cluster_threshold_px,
        max_radius_km,
        fetch_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VOLTSPOT_ENV".to_string(),
            reason: format!("expected development, test, or production; got {other}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
