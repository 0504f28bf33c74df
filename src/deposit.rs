//! Term deposit record and lifecycle state.

use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use crate::interest::InterestPolicy;
use std::fmt;

/// Term deposit identifier, assigned sequentially in creation order.
pub type DepositId = u64;

/// Lifecycle of a term deposit.
///
/// `Open -> Accruing -> Mature -> Redeemed`. A deposit whose term is a single
/// period goes straight from `Open` to `Mature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositState {
    /// Just created, no period elapsed yet.
    Open,
    /// At least one period elapsed, term not yet served.
    Accruing,
    /// Term served; eligible for redemption.
    Mature,
    /// Paid out. Terminal.
    Redeemed,
}

/// A principal locked for a fixed term.
///
/// # Invariants
///
/// - `principal > 0` and `maturity_amount >= principal`, both fixed at creation
/// - `elapsed_periods` only ever increases
/// - `redeemed` goes from `false` to `true` at most once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDeposit {
    id: DepositId,
    owner: String,
    principal: Money,
    term_months: u32,
    elapsed_periods: u32,
    maturity_amount: Money,
    redeemed: bool,
}

impl TermDeposit {
    /// Creates a freshly opened deposit.
    pub(crate) fn open(
        id: DepositId,
        owner: &str,
        principal: Money,
        term_months: u32,
        maturity_amount: Money,
    ) -> Self {
        TermDeposit {
            id,
            owner: owner.to_string(),
            principal,
            term_months,
            elapsed_periods: 0,
            maturity_amount,
            redeemed: false,
        }
    }

    /// Rebuilds a deposit from persisted fields, checking its invariants.
    pub fn restore(
        id: DepositId,
        owner: &str,
        principal: Money,
        term_months: u32,
        elapsed_periods: u32,
        maturity_amount: Money,
        redeemed: bool,
    ) -> Result<Self> {
        if !principal.is_positive() {
            return Err(LedgerError::InvalidAmount(principal.to_string()));
        }
        if term_months == 0 {
            return Err(LedgerError::InvalidTerm(term_months));
        }
        if maturity_amount < principal {
            return Err(LedgerError::InvalidAmount(format!(
                "maturity {} below principal {}",
                maturity_amount, principal
            )));
        }

        Ok(TermDeposit {
            id,
            owner: owner.trim().to_string(),
            principal,
            term_months,
            elapsed_periods,
            maturity_amount,
            redeemed,
        })
    }

    pub fn id(&self) -> DepositId {
        self.id
    }

    /// Username of the account that receives the payout.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn elapsed_periods(&self) -> u32 {
        self.elapsed_periods
    }

    pub fn maturity_amount(&self) -> Money {
        self.maturity_amount
    }

    pub fn is_redeemed(&self) -> bool {
        self.redeemed
    }

    /// Interest earned over the full term.
    pub fn interest(&self) -> Money {
        self.maturity_amount - self.principal
    }

    pub fn required_periods(&self) -> u32 {
        InterestPolicy::required_periods(self.term_months)
    }

    pub fn is_mature(&self) -> bool {
        self.elapsed_periods >= self.required_periods()
    }

    /// Periods left before the deposit matures; zero once mature.
    pub fn remaining_periods(&self) -> u32 {
        self.required_periods().saturating_sub(self.elapsed_periods)
    }

    pub fn state(&self) -> DepositState {
        if self.redeemed {
            DepositState::Redeemed
        } else if self.is_mature() {
            DepositState::Mature
        } else if self.elapsed_periods == 0 {
            DepositState::Open
        } else {
            DepositState::Accruing
        }
    }

    /// Principal plus interest accrued so far.
    pub fn current_value(&self) -> Money {
        InterestPolicy::current_value(self)
    }

    /// Counts one elapsed period. Returns `true` if this made the deposit mature.
    pub(crate) fn advance(&mut self) -> bool {
        let was_mature = self.is_mature();
        self.elapsed_periods = self.elapsed_periods.saturating_add(1);
        !was_mature && self.is_mature()
    }

    pub(crate) fn mark_redeemed(&mut self) {
        self.redeemed = true;
    }
}

impl fmt::Display for TermDeposit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} for {} months | periods {}/{} | current {} -> maturity {}",
            self.id,
            self.principal,
            self.term_months,
            self.elapsed_periods,
            self.required_periods(),
            self.current_value(),
            self.maturity_amount
        )
    }
}
