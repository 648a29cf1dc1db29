//! Application configuration module
//!
//! Provides the validated configuration shared by the dashboard client and the
//! repair-status lookup service. Both refuse to start without credentials for
//! the hosted store.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Password used for the Admin role when none is configured
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Default interval between connectivity probes
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Default timeout applied to every request against the hosted store
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted store (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public (anon) API key for the hosted store
    pub supabase_anon_key: String,
    /// Shared password for the Admin role
    pub admin_password: String,
    /// Location of the local SQLite file; platform data dir when unset
    pub db_path: Option<PathBuf>,
    pub probe_interval: Duration,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    admin_password: Option<String>,
    db_path: Option<PathBuf>,
    probe_interval: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl AppConfigBuilder {
    /// Set the hosted store URL
    pub fn supabase_url(mut self, url: impl Into<String>) -> Self {
        self.supabase_url = Some(url.into());
        self
    }

    /// Set the hosted store anon key
    pub fn supabase_anon_key(mut self, key: impl Into<String>) -> Self {
        self.supabase_anon_key = Some(key.into());
        self
    }

    pub fn admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(password.into());
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = Some(interval);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the configuration
    ///
    /// Fails when the store URL or key is missing (or blank), or when the URL
    /// is not an absolute http(s) URL.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let supabase_url = self
            .supabase_url
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingValue("SUPABASE_URL"))?;
        let supabase_anon_key = self
            .supabase_anon_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingValue("SUPABASE_ANON_KEY"))?;

        let parsed = reqwest::Url::parse(supabase_url.trim())
            .map_err(|_| ConfigError::InvalidUrl(supabase_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(supabase_url));
        }

        let probe_interval = self.probe_interval.unwrap_or(DEFAULT_PROBE_INTERVAL);
        if probe_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "REPAIRDESK_PROBE_SECS",
                value: "0".to_string(),
            });
        }

        Ok(AppConfig {
            supabase_url: supabase_url.trim().trim_end_matches('/').to_string(),
            supabase_anon_key: supabase_anon_key.trim().to_string(),
            admin_password: self
                .admin_password
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            db_path: self.db_path,
            probe_interval,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
