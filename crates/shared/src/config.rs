//! Ledger configuration.
//!
//! All tunables are threaded into the core's entry points as one immutable
//! object; no process-wide mutable state exists.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::money::{CurrencyCode, RoundingMode};

/// Immutable configuration recognized by the ledger core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base (functional) currency for all balances and totals.
    #[serde(default = "CurrencyCode::usd")]
    pub base_currency: CurrencyCode,
    /// Rounding mode applied at display boundaries and allocation splits.
    #[serde(default)]
    pub rounding_mode: RoundingMode,
    /// Tolerance for balance comparisons, in base-currency units.
    #[serde(default = "default_epsilon")]
    pub monetary_epsilon: Decimal,
    /// Days after a closed period's end during which posting is still accepted.
    #[serde(default)]
    pub period_open_grace_days: u32,
    /// How often the recurring scheduler wakes.
    #[serde(default = "default_scheduler_interval", with = "duration_secs")]
    pub recurring_scheduler_interval: Duration,
    /// Company time zone, used to stamp posting dates.
    #[serde(default = "default_time_zone")]
    pub time_zone: chrono_tz::Tz,
}

fn default_epsilon() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_scheduler_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_time_zone() -> chrono_tz::Tz {
    chrono_tz::Tz::UTC
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::usd(),
            rounding_mode: RoundingMode::HalfEven,
            monetary_epsilon: default_epsilon(),
            period_open_grace_days: 0,
            recurring_scheduler_interval: default_scheduler_interval(),
            time_zone: default_time_zone(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(config.rounding_mode, RoundingMode::HalfEven);
        assert_eq!(config.monetary_epsilon, dec!(0.01));
        assert_eq!(config.period_open_grace_days, 0);
        assert_eq!(config.recurring_scheduler_interval, Duration::from_secs(3600));
        assert_eq!(config.time_zone, chrono_tz::Tz::UTC);
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_currency.as_str(), "USD");
        assert_eq!(config.monetary_epsilon, dec!(0.01));
    }
}
