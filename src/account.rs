//! Customer account model and balance operations.
//!
//! Maintains the invariant: `balance >= 0` at all times.

use crate::decimal::Money;
use crate::error::{LedgerError, Result};

/// A customer's account.
///
/// # Invariants
///
/// - `balance` is never negative; a mutation that would make it negative is
///   rejected before anything is written
/// - every mutation moves the balance by a strictly positive amount
///
/// Accounts are not synchronized on their own; the store wraps each one in a
/// lock and only ever mutates it through these methods.
#[derive(Debug, Clone)]
pub struct Account {
    username: String,
    display_name: String,
    balance: Money,
    credential: String,
}

impl Account {
    /// Creates a new account with a zero balance.
    ///
    /// The username is trimmed and must not be blank.
    pub fn new(username: &str, display_name: &str, credential: &str) -> Result<Self> {
        Self::with_balance(username, display_name, credential, Money::ZERO)
    }

    /// Creates an account with an opening balance, as restored from a snapshot.
    pub fn with_balance(
        username: &str,
        display_name: &str,
        credential: &str,
        balance: Money,
    ) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LedgerError::InvalidAccount("username is blank".into()));
        }
        if balance.is_negative() {
            return Err(LedgerError::InvalidAccount(format!(
                "negative opening balance {} for '{}'",
                balance, username
            )));
        }

        Ok(Account {
            username: username.to_string(),
            display_name: display_name.trim().to_string(),
            balance,
            credential: credential.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Credits funds to the account.
    pub fn credit(&mut self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        self.commit(self.balance + amount)
    }

    /// Debits funds from the account.
    ///
    /// Fails with `InsufficientFunds` when `amount > balance`.
    pub fn debit(&mut self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }
        self.commit(self.balance - amount)
    }

    /// Returns `true` if `candidate` matches the stored credential.
    pub fn verify_credential(&self, candidate: &str) -> bool {
        self.credential == candidate
    }

    /// Replaces the credential after checking the current one.
    pub fn change_credential(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.verify_credential(old) || new.trim().is_empty() {
            return Err(LedgerError::InvalidCredential(self.username.clone()));
        }
        self.credential = new.to_string();
        Ok(())
    }

    fn commit(&mut self, next: Money) -> Result<()> {
        if next.is_negative() {
            return Err(LedgerError::InvariantViolation(format!(
                "balance of '{}' would become {}",
                self.username, next
            )));
        }
        self.balance = next;
        Ok(())
    }
}
