//! Ledger settings loaded from config.toml
//!
//! The file names the reporting currency every amount is normalized into, the
//! time bound on exchange rate lookups, the size of the dashboard activity feed,
//! and a static table of exchange rates used by the bundled rate provider.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, time::Duration};
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Currency all stored amounts are normalized into
    pub reporting_currency: String,
    /// Upper bound on a single exchange rate lookup, in milliseconds
    pub rate_timeout_ms: u64,
    /// Number of entries in the dashboard activity feed
    pub recent_activity_limit: usize,
    /// Rates to the reporting currency, keyed by currency code
    pub rates: HashMap<String, f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reporting_currency: "ILS".to_string(),
            rate_timeout_ms: 2_000,
            recent_activity_limit: crate::core::dashboard::RECENT_ACTIVITY_LIMIT,
            rates: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Rate lookup bound as a [`Duration`].
    #[must_use]
    pub const fn rate_timeout(&self) -> Duration {
        Duration::from_millis(self.rate_timeout_ms)
    }

    /// Parses configuration from TOML text and normalizes currency codes.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        self.reporting_currency = crate::core::money::parse_currency_code(&self.reporting_currency)
            .map_err(|e| Error::Config {
                message: format!("Invalid reporting_currency: {e}"),
            })?;

        let mut normalized = HashMap::with_capacity(self.rates.len());
        for (code, rate) in self.rates.drain() {
            let code = crate::core::money::parse_currency_code(&code).map_err(|e| Error::Config {
                message: format!("Invalid currency in [rates]: {e}"),
            })?;
            if !rate.is_finite() || rate <= 0.0 {
                return Err(Error::Config {
                    message: format!("Rate for {code} must be a positive number, got {rate}"),
                });
            }
            normalized.insert(code, rate);
        }
        self.rates = normalized;

        if self.recent_activity_limit == 0 {
            return Err(Error::Config {
                message: "recent_activity_limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file.
///
/// A missing file is not an error: the defaults are returned instead, so a
/// fresh checkout runs with the reporting currency and no static rates.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        info!("No configuration file at {path_ref:?}, using defaults");
        return Ok(AppConfig::default());
    }

    debug!("Loading configuration from: {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    AppConfig::from_toml(&contents)
}

/// Loads configuration from `FINSIGHT_CONFIG`, or ./config.toml when unset.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("FINSIGHT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            reporting_currency = "ils"
            rate_timeout_ms = 500

            [rates]
            usd = 3.7
            EUR = 4.0
        "#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.reporting_currency, "ILS");
        assert_eq!(config.rate_timeout(), Duration::from_millis(500));
        assert_eq!(config.recent_activity_limit, 5);
        assert_eq!(config.rates.get("USD"), Some(&3.7));
        assert_eq!(config.rates.get("EUR"), Some(&4.0));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.reporting_currency, "ILS");
        assert_eq!(config.rate_timeout_ms, 2_000);
        assert!(config.rates.is_empty());
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let result = AppConfig::from_toml("[rates]\nUSD = 0.0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_bad_currency_code() {
        let result = AppConfig::from_toml("reporting_currency = \"shekel\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config("does/not/exist.toml").unwrap();
        assert_eq!(config.reporting_currency, "ILS");
    }
}
