//! Ledger configuration.

use crate::error::{LedgerError, Result};
use crate::interest::InterestPolicy;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the accrual tick interval in milliseconds.
pub const TICK_MS_VAR: &str = "LEDGER_TICK_MS";

/// Environment variable holding the savings interest rate as a fraction.
pub const INTEREST_RATE_VAR: &str = "LEDGER_INTEREST_RATE";

/// Settings consumed when a ledger is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Time between two accrual ticks.
    pub tick_interval: Duration,

    /// Savings interest credited to every account per tick, e.g. `0.02`.
    pub interest_rate: Decimal,

    /// Term-to-rate table for term deposits.
    pub policy: InterestPolicy,
}

impl LedgerConfig {
    /// Default tick: one simulated year every 5 seconds.
    pub const DEFAULT_TICK: Duration = Duration::from_secs(5);

    /// Reads overrides from `LEDGER_TICK_MS` and `LEDGER_INTEREST_RATE`.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(raw) = env::var(TICK_MS_VAR) {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                LedgerError::Config(format!("{} must be a whole number, got '{}'", TICK_MS_VAR, raw))
            })?;
            config = config.with_tick_interval(Duration::from_millis(millis))?;
        }

        if let Ok(raw) = env::var(INTEREST_RATE_VAR) {
            let rate = Decimal::from_str(raw.trim()).map_err(|_| {
                LedgerError::Config(format!("{} must be a decimal, got '{}'", INTEREST_RATE_VAR, raw))
            })?;
            config = config.with_interest_rate(rate)?;
        }

        Ok(config)
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(LedgerError::Config("tick interval must be positive".into()));
        }
        self.tick_interval = interval;
        Ok(self)
    }

    pub fn with_interest_rate(mut self, rate: Decimal) -> Result<Self> {
        if rate < Decimal::ZERO {
            return Err(LedgerError::Config(format!(
                "interest rate must not be negative, got {}",
                rate
            )));
        }
        self.interest_rate = rate;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: InterestPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            tick_interval: Self::DEFAULT_TICK,
            interest_rate: Decimal::new(2, 2),
            policy: InterestPolicy::standard(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(5));
        assert_eq!(config.interest_rate.to_string(), "0.02");
        assert_eq!(config.policy, InterestPolicy::standard());
    }

    #[test]
    fn test_builder_validation() {
        let config = LedgerConfig::default();
        assert!(config.clone().with_tick_interval(Duration::ZERO).is_err());
        assert!(config
            .clone()
            .with_interest_rate(Decimal::from_str("-0.01").unwrap())
            .is_err());

        let config = config
            .with_tick_interval(Duration::from_millis(20))
            .unwrap()
            .with_interest_rate(Decimal::ZERO)
            .unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(20));
        assert!(config.interest_rate.is_zero());
    }
}
