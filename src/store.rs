//! Account store with per-account locking.
//!
//! The account map is behind an `RwLock` that is only write-locked to add
//! accounts. Each account sits behind its own `Mutex`, so balance operations
//! on different accounts never wait on each other, while every operation on
//! one account is serialized through [`LedgerStore::with_account`].

use crate::account::Account;
use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use crate::interest::InterestPolicy;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Acquires a mutex, recovering the guard if a previous holder panicked.
///
/// Every mutation validates before it writes, so a poisoned value is still
/// consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// All accounts of the ledger, indexed by username.
#[derive(Debug, Default)]
pub struct LedgerStore {
    accounts: RwLock<HashMap<String, Arc<Mutex<Account>>>>,
}

impl LedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        LedgerStore {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new account with a zero balance.
    pub fn register(&self, username: &str, display_name: &str, credential: &str) -> Result<()> {
        let account = Account::new(username, display_name, credential)?;
        self.insert(account)
    }

    /// Adds a fully-formed account, as restored from a snapshot.
    pub fn insert(&self, account: Account) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if accounts.contains_key(account.username()) {
            return Err(LedgerError::DuplicateAccount(account.username().to_string()));
        }

        debug!("Registered account '{}'", account.username());
        accounts.insert(
            account.username().to_string(),
            Arc::new(Mutex::new(account)),
        );
        Ok(())
    }

    /// Adds every account of an import in one step.
    ///
    /// Fails without inserting anything if the store already holds accounts or
    /// a username repeats.
    pub fn insert_all(&self, batch: Vec<Account>) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if !accounts.is_empty() {
            return Err(LedgerError::ImportNotEmpty);
        }

        let mut staged = HashMap::with_capacity(batch.len());
        for account in batch {
            let username = account.username().to_string();
            if staged.contains_key(&username) {
                return Err(LedgerError::DuplicateAccount(username));
            }
            staged.insert(username, Arc::new(Mutex::new(account)));
        }

        debug!("Imported {} account(s) into the store", staged.len());
        *accounts = staged;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(username.trim())
    }

    /// Returns all usernames in ascending order.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Deposits a positive amount. Returns the new balance.
    pub fn deposit(&self, username: &str, amount: Money) -> Result<Money> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        let balance = self.with_account(username, |account| {
            account.credit(amount)?;
            Ok(account.balance())
        })?;
        debug!("Deposited {} to '{}'", amount, username);
        Ok(balance)
    }

    /// Withdraws a positive amount no larger than the balance. Returns the new balance.
    pub fn withdraw(&self, username: &str, amount: Money) -> Result<Money> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        let balance = self.with_account(username, |account| {
            account.debit(amount)?;
            Ok(account.balance())
        })?;
        debug!("Withdrew {} from '{}'", amount, username);
        Ok(balance)
    }

    pub fn balance(&self, username: &str) -> Result<Money> {
        self.with_account(username, |account| Ok(account.balance()))
    }

    /// Credits savings interest at `rate` and returns the amount credited.
    ///
    /// Nothing is credited when the balance is zero or the rounded interest
    /// is zero. The credit takes the same locked path as [`LedgerStore::deposit`].
    pub fn apply_interest(&self, username: &str, rate: Decimal) -> Result<Money> {
        self.with_account(username, |account| {
            if !account.balance().is_positive() {
                return Ok(Money::ZERO);
            }
            let delta = InterestPolicy::accrual(account.balance(), rate);
            if !delta.is_positive() {
                return Ok(Money::ZERO);
            }
            account.credit(delta)?;
            Ok(delta)
        })
    }

    /// Checks a credential. Unknown accounts and mismatches are reported alike.
    pub fn authenticate(&self, username: &str, credential: &str) -> Result<()> {
        let verified = self
            .with_account(username, |account| Ok(account.verify_credential(credential)))
            .unwrap_or(false);
        if verified {
            Ok(())
        } else {
            Err(LedgerError::InvalidCredential(username.trim().to_string()))
        }
    }

    pub fn change_credential(&self, username: &str, old: &str, new: &str) -> Result<()> {
        self.with_account(username, |account| account.change_credential(old, new))
    }

    pub fn display_name(&self, username: &str) -> Result<String> {
        self.with_account(username, |account| Ok(account.display_name().to_string()))
    }

    /// Returns a copy of the account as it is at this instant.
    pub fn snapshot(&self, username: &str) -> Result<Account> {
        self.with_account(username, |account| Ok(account.clone()))
    }

    /// Runs `f` with the account locked.
    ///
    /// This is the only path through which an account is read or written.
    pub(crate) fn with_account<T>(
        &self,
        username: &str,
        f: impl FnOnce(&mut Account) -> Result<T>,
    ) -> Result<T> {
        let handle = self.handle(username)?;
        let mut account = lock(&handle);
        f(&mut *account)
    }

    fn handle(&self, username: &str) -> Result<Arc<Mutex<Account>>> {
        let username = username.trim();
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownAccount(username.to_string()))
    }
}
