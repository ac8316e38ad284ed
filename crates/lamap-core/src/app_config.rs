use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime configuration, read from `LAMAP_*` environment variables.
///
/// Every field has a default; the app starts with no environment at all.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Optional YAML zones file; the built-in LA zones are used when unset.
    pub zones_path: Option<PathBuf>,
    pub overpass_base_url: String,
    pub nominatim_base_url: String,
    pub overpass_timeout_secs: u64,
    pub nominatim_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_ms: u64,
    pub poi_cache_ttl_secs: u64,
}
