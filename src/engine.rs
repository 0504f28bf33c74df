//! Term deposit engine.
//!
//! Owns the deposit book and moves funds between accounts and deposits
//! through the [`LedgerStore`]. Every engine operation holds the book lock for
//! its whole duration, and takes account locks only while holding it, so the
//! lock order is always book -> account.

use crate::decimal::Money;
use crate::deposit::{DepositId, TermDeposit};
use crate::error::{LedgerError, Result};
use crate::interest::InterestPolicy;
use crate::store::{lock, LedgerStore};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// All term deposits, in creation order.
#[derive(Debug)]
struct DepositBook {
    deposits: BTreeMap<DepositId, TermDeposit>,
    next_id: DepositId,
}

impl DepositBook {
    fn new() -> Self {
        DepositBook {
            deposits: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Manages the lifecycle of term deposits.
///
/// # Atomicity
///
/// - `open` debits the principal and inserts the record under one book lock;
///   a failed debit inserts nothing
/// - `redeem` credits the maturity amount and sets the redeemed flag under one
///   book lock; the flag is only set once the credit succeeded
/// - `advance_all_by_one_period` updates every deposit under one book lock, so
///   readers see either the pre-tick or the post-tick book, never a mix
#[derive(Debug)]
pub struct TermDepositEngine {
    store: Arc<LedgerStore>,
    policy: InterestPolicy,
    book: Mutex<DepositBook>,
}

impl TermDepositEngine {
    /// Creates an engine with an empty deposit book.
    pub fn new(store: Arc<LedgerStore>, policy: InterestPolicy) -> Self {
        TermDepositEngine {
            store,
            policy,
            book: Mutex::new(DepositBook::new()),
        }
    }

    pub fn policy(&self) -> &InterestPolicy {
        &self.policy
    }

    /// Opens a term deposit, debiting `principal` from `owner`.
    pub fn open(&self, owner: &str, principal: Money, term_months: u32) -> Result<TermDeposit> {
        if !principal.is_positive() {
            return Err(LedgerError::InvalidAmount(principal.to_string()));
        }
        let maturity_amount = self.policy.maturity_amount(principal, term_months)?;
        let owner = owner.trim();

        let mut book = lock(&self.book);
        let id = book.next_id;
        let next_id = id.checked_add(1).ok_or(LedgerError::DepositIdOverflow(id))?;
        self.store.withdraw(owner, principal)?;

        book.next_id = next_id;
        let deposit = TermDeposit::open(id, owner, principal, term_months, maturity_amount);
        book.deposits.insert(id, deposit.clone());

        debug!(
            "Opened term deposit {} for '{}': {} over {} months, matures at {}",
            id, owner, principal, term_months, maturity_amount
        );
        Ok(deposit)
    }

    /// Counts one elapsed period on every deposit not yet redeemed.
    ///
    /// Returns the number of deposits that became mature in this call.
    pub fn advance_all_by_one_period(&self) -> usize {
        let mut book = lock(&self.book);
        let matured = book
            .deposits
            .values_mut()
            .filter(|deposit| !deposit.is_redeemed())
            .map(|deposit| deposit.advance())
            .filter(|&became_mature| became_mature)
            .count();

        if matured > 0 {
            debug!("{} term deposit(s) matured", matured);
        }
        matured
    }

    /// Pays out a mature deposit to its owner.
    ///
    /// Returns the deposit as it stands after redemption.
    pub fn redeem(&self, id: DepositId) -> Result<TermDeposit> {
        let mut book = lock(&self.book);
        let deposit = book
            .deposits
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(id))?;

        if deposit.is_redeemed() {
            return Err(LedgerError::AlreadyRedeemed(id));
        }
        if !deposit.is_mature() {
            return Err(LedgerError::NotMature {
                id,
                remaining: deposit.remaining_periods(),
            });
        }

        self.store
            .deposit(deposit.owner(), deposit.maturity_amount())?;
        deposit.mark_redeemed();

        debug!(
            "Redeemed term deposit {}: {} credited to '{}' (interest {})",
            id,
            deposit.maturity_amount(),
            deposit.owner(),
            deposit.interest()
        );
        Ok(deposit.clone())
    }

    /// Deposits of `owner` not yet redeemed, in creation order.
    pub fn list_active(&self, owner: &str) -> Vec<TermDeposit> {
        let owner = owner.trim();
        lock(&self.book)
            .deposits
            .values()
            .filter(|deposit| !deposit.is_redeemed() && deposit.owner() == owner)
            .cloned()
            .collect()
    }

    /// Every deposit, redeemed ones included, in creation order.
    pub fn list_all(&self) -> Vec<TermDeposit> {
        lock(&self.book).deposits.values().cloned().collect()
    }

    pub fn get(&self, id: DepositId) -> Result<TermDeposit> {
        lock(&self.book)
            .deposits
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    /// Balance of `owner` plus the current value of their active deposits.
    ///
    /// The balance is read while the book is locked, so a concurrent
    /// open or redeem is counted exactly once.
    pub fn portfolio_value(&self, owner: &str) -> Result<Money> {
        let book = lock(&self.book);
        let balance = self.store.balance(owner)?;
        let owner = owner.trim();
        let locked: Money = book
            .deposits
            .values()
            .filter(|deposit| !deposit.is_redeemed() && deposit.owner() == owner)
            .map(TermDeposit::current_value)
            .sum();
        Ok(balance + locked)
    }

    /// Runs `f` over the deposit book while it is locked.
    pub(crate) fn with_book<T>(&self, f: impl FnOnce(&BTreeMap<DepositId, TermDeposit>) -> T) -> T {
        let book = lock(&self.book);
        f(&book.deposits)
    }

    /// Loads persisted deposits into an empty book.
    ///
    /// Owners must already exist in the store. New deposits are numbered
    /// after the highest restored id.
    pub fn restore(&self, deposits: Vec<TermDeposit>) -> Result<()> {
        self.restore_with(deposits, || Ok(()))
    }

    /// Like [`TermDepositEngine::restore`], but runs `insert_owners` after the
    /// deposits are validated and before they are installed, all under the
    /// book lock. A rejected deposit set never reaches `insert_owners`.
    pub(crate) fn restore_with(
        &self,
        deposits: Vec<TermDeposit>,
        insert_owners: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        let mut book = lock(&self.book);
        if !book.deposits.is_empty() {
            return Err(LedgerError::ImportNotEmpty);
        }

        let mut restored = BTreeMap::new();
        for deposit in deposits {
            let id = deposit.id();
            if restored.insert(id, deposit).is_some() {
                return Err(LedgerError::DuplicateDeposit(id));
            }
        }
        let next_id = match restored.keys().next_back() {
            Some(&last) => last
                .checked_add(1)
                .ok_or(LedgerError::DepositIdOverflow(last))?,
            None => 1,
        };

        insert_owners()?;
        if let Some(orphan) = restored
            .values()
            .find(|deposit| !self.store.contains(deposit.owner()))
        {
            return Err(LedgerError::UnknownAccount(orphan.owner().to_string()));
        }

        book.next_id = next_id;
        book.deposits = restored;
        Ok(())
    }
}
