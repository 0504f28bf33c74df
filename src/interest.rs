//! Interest policy: term-to-rate table and the pure interest functions.
//!
//! All arithmetic is exact decimal. Intermediate values keep at least 4
//! decimal places; results are rounded half-up to 2 places at the final step.

use crate::decimal::Money;
use crate::deposit::TermDeposit;
use crate::error::{LedgerError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Months covered by one accrual period (yearly ticks).
pub const MONTHS_PER_PERIOD: u32 = 12;

/// Decimal places kept for the `term / 12` year fraction.
const YEAR_FRACTION_SCALE: u32 = 4;

/// Immutable mapping from term length (months) to annual rate.
///
/// Longer terms always carry a strictly higher rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestPolicy {
    rates: BTreeMap<u32, Decimal>,
}

impl InterestPolicy {
    /// The standard table: 3 -> 1.5%, 6 -> 2.0%, 12 -> 2.5%, 24 -> 3.0%, 36 -> 3.5%.
    pub fn standard() -> Self {
        let rates = [
            (3, Decimal::new(15, 3)),
            (6, Decimal::new(20, 3)),
            (12, Decimal::new(25, 3)),
            (24, Decimal::new(30, 3)),
            (36, Decimal::new(35, 3)),
        ];
        InterestPolicy {
            rates: rates.into_iter().collect(),
        }
    }

    /// Builds a policy from a custom table.
    ///
    /// The table must be non-empty, terms positive, rates non-negative and
    /// strictly increasing with the term.
    pub fn new(table: impl IntoIterator<Item = (u32, Decimal)>) -> Result<Self> {
        let mut rates = BTreeMap::new();
        for (term, rate) in table {
            if term == 0 {
                return Err(LedgerError::Config("term length must be positive".into()));
            }
            if rate < Decimal::ZERO {
                return Err(LedgerError::Config(format!(
                    "negative rate {} for {} month term",
                    rate, term
                )));
            }
            if rates.insert(term, rate).is_some() {
                return Err(LedgerError::Config(format!(
                    "{} month term listed twice",
                    term
                )));
            }
        }

        if rates.is_empty() {
            return Err(LedgerError::Config("rate table is empty".into()));
        }
        let increasing = rates
            .values()
            .zip(rates.values().skip(1))
            .all(|(shorter, longer)| longer > shorter);
        if !increasing {
            return Err(LedgerError::Config(
                "rates must increase with the term length".into(),
            ));
        }

        Ok(InterestPolicy { rates })
    }

    /// Annual rate for a supported term.
    pub fn rate_for(&self, term_months: u32) -> Result<Decimal> {
        self.rates
            .get(&term_months)
            .copied()
            .ok_or(LedgerError::InvalidTerm(term_months))
    }

    /// Supported terms in ascending order.
    pub fn supported_terms(&self) -> Vec<u32> {
        self.rates.keys().copied().collect()
    }

    /// Annual rate as a percentage string, e.g. `"2.50%"`.
    pub fn rate_display(&self, term_months: u32) -> Result<String> {
        let percent = (self.rate_for(term_months)? * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Ok(format!("{:.2}%", percent))
    }

    /// Principal plus simple interest over the full term.
    ///
    /// `principal + principal * rate * (term / 12)`, with `term / 12` held at
    /// 4 decimal places.
    pub fn maturity_amount(&self, principal: Money, term_months: u32) -> Result<Money> {
        let rate = self.rate_for(term_months)?;
        let years = (Decimal::from(term_months) / Decimal::from(MONTHS_PER_PERIOD))
            .round_dp_with_strategy(YEAR_FRACTION_SCALE, RoundingStrategy::MidpointAwayFromZero);
        let principal = principal.as_decimal();
        Ok(Money::round_half_up(principal + principal * rate * years))
    }

    /// Number of accrual periods before a deposit of this term matures.
    pub fn required_periods(term_months: u32) -> u32 {
        term_months.div_ceil(MONTHS_PER_PERIOD)
    }

    /// Display value of a deposit: linear between principal and maturity
    /// amount, pegged at the maturity amount once mature.
    pub fn current_value(deposit: &TermDeposit) -> Money {
        let required = Self::required_periods(deposit.term_months());
        if deposit.elapsed_periods() >= required {
            return deposit.maturity_amount();
        }

        let principal = deposit.principal().as_decimal();
        let interest = deposit.maturity_amount().as_decimal() - principal;
        let accrued =
            interest * Decimal::from(deposit.elapsed_periods()) / Decimal::from(required);
        Money::round_half_up(principal + accrued)
    }

    /// Savings interest for one period: `balance * rate`, rounded half-up.
    pub fn accrual(balance: Money, rate: Decimal) -> Money {
        Money::round_half_up(balance.as_decimal() * rate)
    }
}

impl Default for InterestPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn deposit(principal: &str, term: u32, elapsed: u32) -> TermDeposit {
        let policy = InterestPolicy::standard();
        let maturity = policy.maturity_amount(money(principal), term).unwrap();
        TermDeposit::restore(1, "alice", money(principal), term, elapsed, maturity, false)
            .unwrap()
    }

    #[test]
    fn test_rate_lookup() {
        let policy = InterestPolicy::standard();
        assert_eq!(policy.rate_for(12).unwrap(), Decimal::from_str("0.025").unwrap());
        assert!(matches!(policy.rate_for(7), Err(LedgerError::InvalidTerm(7))));
        assert_eq!(policy.supported_terms(), vec![3, 6, 12, 24, 36]);
        assert_eq!(policy.rate_display(12).unwrap(), "2.50%");
    }

    #[test]
    fn test_maturity_amount_for_each_standard_term() {
        let policy = InterestPolicy::standard();
        let principal = money("1000.00");
        assert_eq!(policy.maturity_amount(principal, 3).unwrap(), money("1003.75"));
        assert_eq!(policy.maturity_amount(principal, 6).unwrap(), money("1010.00"));
        assert_eq!(policy.maturity_amount(principal, 12).unwrap(), money("1025.00"));
        assert_eq!(policy.maturity_amount(principal, 24).unwrap(), money("1060.00"));
        assert_eq!(policy.maturity_amount(principal, 36).unwrap(), money("1105.00"));
    }

    #[test]
    fn test_maturity_amount_rounds_half_up_at_the_end() {
        // 333.33 * 0.015 * 0.25 = 1.2499875 -> 334.58
        let policy = InterestPolicy::standard();
        assert_eq!(
            policy.maturity_amount(money("333.33"), 3).unwrap(),
            money("334.58")
        );
    }

    #[test]
    fn test_maturity_amount_rejects_unknown_term() {
        let policy = InterestPolicy::standard();
        assert!(matches!(
            policy.maturity_amount(money("10"), 18),
            Err(LedgerError::InvalidTerm(18))
        ));
    }

    #[test]
    fn test_required_periods() {
        assert_eq!(InterestPolicy::required_periods(3), 1);
        assert_eq!(InterestPolicy::required_periods(6), 1);
        assert_eq!(InterestPolicy::required_periods(12), 1);
        assert_eq!(InterestPolicy::required_periods(24), 2);
        assert_eq!(InterestPolicy::required_periods(36), 3);
    }

    #[test]
    fn test_current_value_is_linear_and_pegged() {
        assert_eq!(deposit("1000.00", 36, 0).current_value(), money("1000.00"));
        assert_eq!(deposit("1000.00", 36, 1).current_value(), money("1035.00"));
        assert_eq!(deposit("1000.00", 36, 2).current_value(), money("1070.00"));
        assert_eq!(deposit("1000.00", 36, 3).current_value(), money("1105.00"));
        assert_eq!(deposit("1000.00", 36, 9).current_value(), money("1105.00"));
    }

    #[test]
    fn test_current_value_is_monotonic() {
        let mut previous = Money::ZERO;
        for elapsed in 0..5 {
            let value = deposit("777.77", 36, elapsed).current_value();
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_accrual() {
        let rate = Decimal::from_str("0.02").unwrap();
        assert_eq!(InterestPolicy::accrual(money("1000.00"), rate), money("20.00"));
        assert_eq!(InterestPolicy::accrual(money("0.24"), rate), Money::ZERO);
        assert_eq!(InterestPolicy::accrual(money("0.25"), rate), money("0.01"));
    }

    #[test]
    fn test_custom_table_validation() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert!(InterestPolicy::new([(6, d("0.01")), (12, d("0.02"))]).is_ok());
        assert!(InterestPolicy::new([(6, d("0.02")), (12, d("0.02"))]).is_err());
        assert!(InterestPolicy::new([(0, d("0.01"))]).is_err());
        assert!(InterestPolicy::new([(6, d("-0.01"))]).is_err());
        assert!(InterestPolicy::new(Vec::new()).is_err());
    }
}
