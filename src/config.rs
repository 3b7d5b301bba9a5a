use crate::domain::money::Money;
use crate::domain::quota::CreditTier;
use crate::domain::risk::CodSettings;
use crate::domain::shipping::ShippingPolicy;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Quota ledger tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Remaining-credit threshold below which the "quota low" signal fires.
    pub low_water_mark: i64,
    /// TTL for the cached free-tier limit setting, in seconds.
    pub settings_ttl_secs: u64,
    /// Ordered price brackets mapping unit price to credit cost.
    pub tiers: Vec<CreditTier>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            low_water_mark: 10,
            settings_ttl_secs: 300,
            tiers: vec![
                CreditTier {
                    min_price: Money::new(Decimal::ZERO),
                    max_price: Some(Money::new(Decimal::from(50_000))),
                    credit_cost: 1,
                },
                CreditTier {
                    min_price: Money::new(Decimal::from(50_001)),
                    max_price: Some(Money::new(Decimal::from(250_000))),
                    credit_cost: 2,
                },
                CreditTier {
                    min_price: Money::new(Decimal::from(250_001)),
                    max_price: None,
                    credit_cost: 3,
                },
            ],
        }
    }
}

/// Versioned application configuration with defaults applied at the boundary.
///
/// Every section deserializes from layered config files plus the environment;
/// a missing section or file falls back to the defaults below, so the binary
/// runs with no configuration present at all. Monetary values in config files
/// are written as strings (e.g. `"8000"`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub shipping: ShippingPolicy,
    pub cod: CodSettings,
    pub quota: QuotaConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CHECKOUT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_complete() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.quota.low_water_mark, 10);
        assert_eq!(cfg.quota.settings_ttl_secs, 300);
        assert_eq!(cfg.cod.max_amount, Money::new(dec!(500000)));
        assert!(cfg.shipping.max_fee > cfg.shipping.min_fee);
        assert_eq!(cfg.quota.tiers.len(), 3);
    }

    #[test]
    fn test_sections_deserialize_from_partial_json() {
        let cfg: AppConfig = serde_json::from_str(r#"{"quota": {"low_water_mark": 5}}"#).unwrap();
        assert_eq!(cfg.quota.low_water_mark, 5);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.quota.settings_ttl_secs, 300);
        assert!(cfg.cod.enabled);
    }
}
