//! Profile-service client configuration.
//!
//! Points the client at the portal backend. Defaults target a local
//! development server. Override via environment variables or explicit
//! construction for staging/testing.

use url::Url;

/// Default base URL when `PORTAL_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the profile service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalApiConfig {
    /// Base URL of the portal backend. Always ends with `/`.
    pub base_url: Url,
    /// Request timeout in seconds. A timeout is an ordinary transport failure.
    pub timeout_secs: u64,
    /// Retries after the first attempt on transport failures.
    pub max_retries: u32,
}

impl PortalApiConfig {
    /// Build a configuration for `base_url` with default timeout and retries.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("base_url", base_url)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: crate::retry::default_max_retries(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORTAL_API_URL` (default: `http://127.0.0.1:8000`)
    /// - `PORTAL_TIMEOUT_SECS` (default: 30)
    /// - `PORTAL_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = std::env::var("PORTAL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Ok(Self {
            base_url: parse_base_url("PORTAL_API_URL", &raw)?,
            timeout_secs: env_parse("PORTAL_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_retries: env_parse("PORTAL_MAX_RETRIES")
                .unwrap_or_else(crate::retry::default_max_retries),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    ///
    /// Retries are disabled so failure tests stay fast.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            timeout_secs: 5,
            max_retries: 0,
        })
    }
}

/// Parse a base URL and make sure its path ends with `/` so relative
/// endpoint paths append rather than replace the last segment.
fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(
            var.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
