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
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
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

    let parse_zoom = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let zoom: u8 = parse_var(var, &or_default(var, default))?;
        if zoom > crate::geo::MAX_ZOOM {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("zoom must be at most {}", crate::geo::MAX_ZOOM),
            });
        }
        Ok(zoom)
    };

    let api_url = require("FSAMAPS_API_URL")?;
    let env = parse_environment(&or_default("FSAMAPS_ENV", "development"))?;
    let log_level = or_default("FSAMAPS_LOG_LEVEL", "info");
    let request_timeout_secs = parse_var(
        "FSAMAPS_REQUEST_TIMEOUT_SECS",
        &or_default("FSAMAPS_REQUEST_TIMEOUT_SECS", "30"),
    )?;
    let user_agent = or_default("FSAMAPS_USER_AGENT", "fsamaps/0.1 (hygiene-map)");
    let min_fetch_zoom = parse_zoom("FSAMAPS_MIN_FETCH_ZOOM", "16")?;
    let fly_to_zoom = parse_zoom("FSAMAPS_FLY_TO_ZOOM", "18")?;
    let viewport_width_px = parse_var(
        "FSAMAPS_VIEWPORT_WIDTH_PX",
        &or_default("FSAMAPS_VIEWPORT_WIDTH_PX", "1280"),
    )?;
    let viewport_height_px = parse_var(
        "FSAMAPS_VIEWPORT_HEIGHT_PX",
        &or_default("FSAMAPS_VIEWPORT_HEIGHT_PX", "720"),
    )?;

    Ok(AppConfig {
        api_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        min_fetch_zoom,
        fly_to_zoom,
        viewport_width_px,
        viewport_height_px,
    })
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FSAMAPS_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
