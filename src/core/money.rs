//! Monetary normalizer.
//!
//! Converts a submitted amount into the reporting currency. Rates come from an
//! [`ExchangeRateProvider`]; every lookup is time-bounded, and a failed, slow or
//! nonsensical lookup falls back to a rate of 1.0 so the write still goes
//! through. A fallback conversion is flagged as `degraded` and logged; the
//! stored amount may then be inaccurate.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::warn;

/// Rate used whenever a real one cannot be obtained.
pub const FALLBACK_RATE: f64 = 1.0;

/// External collaborator that knows exchange rates to the reporting currency.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Rate that converts one unit of `from_currency` into the reporting currency.
    async fn rate(&self, from_currency: &str) -> Result<f64>;
}

/// Provider backed by a fixed table, typically the `[rates]` section of config.toml.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    rates: HashMap<String, f64>,
}

impl StaticRateTable {
    /// Builds a table from currency code to rate.
    #[must_use]
    pub const fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }
}

#[async_trait]
impl ExchangeRateProvider for StaticRateTable {
    async fn rate(&self, from_currency: &str) -> Result<f64> {
        self.rates
            .get(from_currency)
            .copied()
            .ok_or_else(|| Error::RateUnavailable {
                currency: from_currency.to_string(),
                reason: "no rate configured".to_string(),
            })
    }
}

/// Result of converting one amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Rate that was applied
    pub rate: f64,
    /// Converted amount
    pub amount_in_reporting: f64,
    /// True when the fallback rate was used instead of a real one
    pub degraded: bool,
}

/// Pure conversion step. The rate is ignored for the reporting currency itself.
#[must_use]
pub fn normalize(amount: f64, currency: &str, rate: f64, reporting_currency: &str) -> f64 {
    if currency == reporting_currency {
        amount
    } else {
        amount * rate
    }
}

/// Trims and upper-cases a currency code, rejecting anything but three ASCII letters.
pub fn parse_currency_code(raw: &str) -> Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(Error::validation(format!("malformed currency code: '{raw}'")))
    }
}

/// Converts amounts into the reporting currency using a time-bounded provider.
#[derive(Clone)]
pub struct MonetaryNormalizer {
    provider: Arc<dyn ExchangeRateProvider>,
    reporting_currency: String,
    timeout: Duration,
}

impl std::fmt::Debug for MonetaryNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonetaryNormalizer")
            .field("reporting_currency", &self.reporting_currency)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MonetaryNormalizer {
    /// Creates a normalizer for the given reporting currency.
    #[must_use]
    pub fn new(
        provider: Arc<dyn ExchangeRateProvider>,
        reporting_currency: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            reporting_currency: reporting_currency.into(),
            timeout,
        }
    }

    /// Builds a normalizer over the static rate table from the app config.
    #[must_use]
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(
            Arc::new(StaticRateTable::new(config.rates.clone())),
            config.reporting_currency.clone(),
            config.rate_timeout(),
        )
    }

    /// The single currency all stored amounts are expressed in.
    #[must_use]
    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    /// Looks up the rate for `currency`, never failing.
    ///
    /// Returns the rate and whether the fallback had to be used.
    pub async fn rate_for(&self, currency: &str) -> (f64, bool) {
        if currency == self.reporting_currency {
            return (1.0, false);
        }

        let reason = match tokio::time::timeout(self.timeout, self.provider.rate(currency)).await {
            Ok(Ok(rate)) if rate.is_finite() && rate > 0.0 => return (rate, false),
            Ok(Ok(rate)) => format!("provider returned unusable rate {rate}"),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("lookup exceeded {} ms", self.timeout.as_millis()),
        };

        warn!(
            currency,
            reason = %reason,
            "Exchange rate unavailable, falling back to rate {FALLBACK_RATE}; stored amount may be inaccurate"
        );
        (FALLBACK_RATE, true)
    }

    /// Converts `amount` of `currency` into the reporting currency.
    pub async fn convert(&self, amount: f64, currency: &str) -> Conversion {
        let (rate, degraded) = self.rate_for(currency).await;
        Conversion {
            rate,
            amount_in_reporting: normalize(amount, currency, rate, &self.reporting_currency),
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl ExchangeRateProvider for FailingProvider {
        async fn rate(&self, from_currency: &str) -> Result<f64> {
            Err(Error::RateUnavailable {
                currency: from_currency.to_string(),
                reason: "service down".to_string(),
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl ExchangeRateProvider for SlowProvider {
        async fn rate(&self, _from_currency: &str) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(3.5)
        }
    }

    struct NegativeProvider;

    #[async_trait]
    impl ExchangeRateProvider for NegativeProvider {
        async fn rate(&self, _from_currency: &str) -> Result<f64> {
            Ok(-2.0)
        }
    }

    fn table() -> Arc<dyn ExchangeRateProvider> {
        Arc::new(StaticRateTable::new(HashMap::from([
            ("USD".to_string(), 3.7),
            ("EUR".to_string(), 4.0),
        ])))
    }

    #[test]
    fn test_normalize_is_identity_for_reporting_currency() {
        assert_eq!(normalize(20.0, "ILS", 99.0, "ILS"), 20.0);
        assert_eq!(normalize(10.0, "USD", 3.7, "ILS"), 37.0);
    }

    #[test]
    fn test_parse_currency_code() {
        assert_eq!(parse_currency_code(" usd ").unwrap(), "USD");
        assert!(parse_currency_code("US").is_err());
        assert!(parse_currency_code("US1").is_err());
        assert!(parse_currency_code("").is_err());
        assert!(parse_currency_code("DOLLAR").is_err());
    }

    #[tokio::test]
    async fn test_convert_with_known_rate() {
        let normalizer = MonetaryNormalizer::new(table(), "ILS", Duration::from_millis(100));
        let conversion = normalizer.convert(10.0, "EUR").await;
        assert_eq!(conversion.rate, 4.0);
        assert_eq!(conversion.amount_in_reporting, 40.0);
        assert!(!conversion.degraded);
    }

    #[tokio::test]
    async fn test_reporting_currency_skips_provider() {
        let normalizer =
            MonetaryNormalizer::new(Arc::new(FailingProvider), "ILS", Duration::from_millis(100));
        let conversion = normalizer.convert(20.0, "ILS").await;
        assert_eq!(conversion.amount_in_reporting, 20.0);
        assert!(!conversion.degraded);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_identity_rate() {
        let normalizer =
            MonetaryNormalizer::new(Arc::new(FailingProvider), "ILS", Duration::from_millis(100));
        let conversion = normalizer.convert(12.5, "USD").await;
        assert_eq!(conversion.rate, FALLBACK_RATE);
        assert_eq!(conversion.amount_in_reporting, 12.5);
        assert!(conversion.degraded);
    }

    #[tokio::test]
    async fn test_unknown_currency_in_table_falls_back() {
        let normalizer = MonetaryNormalizer::new(table(), "ILS", Duration::from_millis(100));
        let conversion = normalizer.convert(7.0, "JPY").await;
        assert_eq!(conversion.amount_in_reporting, 7.0);
        assert!(conversion.degraded);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_to_fallback() {
        let normalizer =
            MonetaryNormalizer::new(Arc::new(SlowProvider), "ILS", Duration::from_millis(50));
        let conversion = normalizer.convert(10.0, "USD").await;
        assert_eq!(conversion.rate, FALLBACK_RATE);
        assert!(conversion.degraded);
    }

    #[tokio::test]
    async fn test_unusable_rate_falls_back() {
        let normalizer =
            MonetaryNormalizer::new(Arc::new(NegativeProvider), "ILS", Duration::from_millis(50));
        let conversion = normalizer.convert(10.0, "USD").await;
        assert_eq!(conversion.amount_in_reporting, 10.0);
        assert!(conversion.degraded);
    }
}
