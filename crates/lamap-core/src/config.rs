use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any set env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any set env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("LAMAP_ENV", "development"));
    let bind_addr = parse_addr("LAMAP_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("LAMAP_LOG_LEVEL", "info");
    let zones_path = lookup("LAMAP_ZONES_PATH").ok().map(PathBuf::from);

    let overpass_base_url = or_default(
        "LAMAP_OVERPASS_URL",
        "https://overpass-api.de/api/interpreter",
    );
    let nominatim_base_url =
        or_default("LAMAP_NOMINATIM_URL", "https://nominatim.openstreetmap.org");
    let overpass_timeout_secs = parse_u64("LAMAP_OVERPASS_TIMEOUT_SECS", "45")?;
    let nominatim_timeout_secs = parse_u64("LAMAP_NOMINATIM_TIMEOUT_SECS", "10")?;

    let http_user_agent = or_default("LAMAP_HTTP_USER_AGENT", "lamap/0.1 (la-interactive-map)");
    let http_max_retries = parse_u32("LAMAP_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_ms = parse_u64("LAMAP_HTTP_RETRY_BACKOFF_BASE_MS", "1000")?;
    let poi_cache_ttl_secs = parse_u64("LAMAP_POI_CACHE_TTL_SECS", "3600")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        zones_path,
        overpass_base_url,
        nominatim_base_url,
        overpass_timeout_secs,
        nominatim_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_ms,
        poi_cache_ttl_secs,
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
