use std::path::PathBuf;
use std::time::Duration;

use crate::client::local_db::LocalDatabase;
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Read `primary`, falling back to `fallback` when unset or blank
fn first_set(lookup: &impl Fn(&str) -> Option<String>, primary: &str, fallback: &str) -> Option<String> {
    lookup(primary)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| lookup(fallback).filter(|v| !v.trim().is_empty()))
}

/// Dashboard configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Load from the process environment
    ///
    /// `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `ADMIN_PASSWORD` also accept
    /// their `VITE_`-prefixed names.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = AppConfig::builder();

        if let Some(url) = first_set(&lookup, "SUPABASE_URL", "VITE_SUPABASE_URL") {
            builder = builder.supabase_url(url);
        }
        if let Some(key) = first_set(&lookup, "SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY") {
            builder = builder.supabase_anon_key(key);
        }
        if let Some(password) = first_set(&lookup, "ADMIN_PASSWORD", "VITE_ADMIN_PASSWORD") {
            builder = builder.admin_password(password);
        }
        if let Some(path) = lookup("REPAIRDESK_DB_PATH").filter(|v| !v.trim().is_empty()) {
            builder = builder.db_path(path);
        }
        if let Some(raw) = lookup("REPAIRDESK_PROBE_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "REPAIRDESK_PROBE_SECS",
                value: raw.clone(),
            })?;
            builder = builder.probe_interval(Duration::from_secs(secs));
        }

        Self::with_builder(builder)
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn supabase_url(&self) -> &str {
        &self.app.supabase_url
    }

    pub fn admin_password(&self) -> &str {
        &self.app.admin_password
    }

    /// Local database file, the platform data dir unless overridden
    pub fn db_path(&self) -> PathBuf {
        self.app
            .db_path
            .clone()
            .unwrap_or_else(LocalDatabase::default_path)
    }

    pub fn probe_interval(&self) -> Duration {
        self.app.probe_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_vite_fallbacks() {
        let config = Config::from_lookup(lookup(&[
            ("VITE_SUPABASE_URL", "https://demo.supabase.co"),
            ("VITE_SUPABASE_ANON_KEY", "anon"),
            ("VITE_ADMIN_PASSWORD", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url(), "https://demo.supabase.co");
        assert_eq!(config.admin_password(), "s3cret");
    }

    #[test]
    fn test_primary_name_wins() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://primary.supabase.co"),
            ("VITE_SUPABASE_URL", "https://fallback.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url(), "https://primary.supabase.co");
        assert_eq!(config.admin_password(), "admin123");
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingValue("SUPABASE_URL"));
    }

    #[test]
    fn test_probe_secs_and_db_path() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("REPAIRDESK_PROBE_SECS", "3"),
            ("REPAIRDESK_DB_PATH", "/tmp/desk.db"),
        ]))
        .unwrap();

        assert_eq!(config.probe_interval(), Duration::from_secs(3));
        assert_eq!(config.db_path(), PathBuf::from("/tmp/desk.db"));

        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("REPAIRDESK_PROBE_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "REPAIRDESK_PROBE_SECS", .. }));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("SUPABASE_URL", "https://env.supabase.co/");
        std::env::set_var("SUPABASE_ANON_KEY", "env-key");
        let config = Config::from_env();
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");

        assert_eq!(config.unwrap().supabase_url(), "https://env.supabase.co");
    }
}
