//! Ledger facade.
//!
//! The single entry point for callers. Composes the account store, the term
//! deposit engine and the configured interest settings; adds no locking of
//! its own. Every operation reports failure as a [`LedgerError`] value.

use crate::account::Account;
use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::deposit::{DepositId, TermDeposit};
use crate::engine::TermDepositEngine;
use crate::error::{LedgerError, Result};
use crate::interest::InterestPolicy;
use crate::snapshot::{AccountRecord, DepositRecord};
use crate::store::LedgerStore;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one accrual tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based number of this tick over the life of the ledger.
    pub tick: u64,

    /// Accounts that received a non-zero interest credit.
    pub accounts_credited: usize,

    /// Sum of all interest credited in this tick.
    pub interest_credited: Money,

    /// Term deposits that became mature in this tick.
    pub deposits_matured: usize,
}

/// A banking ledger with savings interest and term deposits.
///
/// Share it between threads with `Arc<Ledger>`; all operations take `&self`.
#[derive(Debug)]
pub struct Ledger {
    store: Arc<LedgerStore>,
    engine: TermDepositEngine,
    interest_rate: Decimal,
    tick_interval: Duration,
    ticks: AtomicU64,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        let store = Arc::new(LedgerStore::new());
        let engine = TermDepositEngine::new(Arc::clone(&store), config.policy);
        Ledger {
            store,
            engine,
            interest_rate: config.interest_rate,
            tick_interval: config.tick_interval,
            ticks: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &InterestPolicy {
        self.engine.policy()
    }

    /// Savings rate applied to every account per tick.
    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Accrual ticks completed so far.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn register_account(
        &self,
        username: &str,
        display_name: &str,
        credential: &str,
    ) -> Result<()> {
        self.store.register(username, display_name, credential)
    }

    pub fn authenticate(&self, username: &str, credential: &str) -> Result<()> {
        self.store.authenticate(username, credential)
    }

    pub fn change_credential(&self, username: &str, old: &str, new: &str) -> Result<()> {
        self.store.change_credential(username, old, new)
    }

    pub fn display_name(&self, username: &str) -> Result<String> {
        self.store.display_name(username)
    }

    /// Deposits `amount` and returns the new balance.
    pub fn deposit(&self, username: &str, amount: Money) -> Result<Money> {
        self.store.deposit(username, amount)
    }

    /// Withdraws `amount` and returns the new balance.
    pub fn withdraw(&self, username: &str, amount: Money) -> Result<Money> {
        self.store.withdraw(username, amount)
    }

    pub fn balance(&self, username: &str) -> Result<Money> {
        self.store.balance(username)
    }

    pub fn open_term_deposit(
        &self,
        username: &str,
        principal: Money,
        term_months: u32,
    ) -> Result<TermDeposit> {
        self.engine.open(username, principal, term_months)
    }

    /// Active deposits of an account, in creation order.
    pub fn list_active_deposits(&self, username: &str) -> Result<Vec<TermDeposit>> {
        if !self.store.contains(username) {
            return Err(LedgerError::UnknownAccount(username.trim().to_string()));
        }
        Ok(self.engine.list_active(username))
    }

    /// Redeems one of `username`'s deposits.
    ///
    /// A deposit owned by someone else is reported as `NotFound`.
    pub fn redeem_term_deposit(&self, username: &str, id: DepositId) -> Result<TermDeposit> {
        if !self.store.contains(username) {
            return Err(LedgerError::UnknownAccount(username.trim().to_string()));
        }
        let deposit = self.engine.get(id)?;
        if deposit.owner() != username.trim() {
            return Err(LedgerError::NotFound(id));
        }
        self.engine.redeem(id)
    }

    /// Balance plus the current value of every active deposit.
    pub fn total_portfolio_value(&self, username: &str) -> Result<Money> {
        self.engine.portfolio_value(username)
    }

    /// Runs one accrual pass: savings interest on every account, then one
    /// elapsed period on every term deposit.
    ///
    /// Each account credit is atomic on its own; the pass as a whole is not
    /// rolled back if a single account fails.
    pub fn run_accrual_tick(&self) -> TickReport {
        let mut accounts_credited = 0;
        let mut interest_credited = Money::ZERO;

        for username in self.store.usernames() {
            match self.store.apply_interest(&username, self.interest_rate) {
                Ok(delta) if delta.is_positive() => {
                    accounts_credited += 1;
                    interest_credited += delta;
                    debug!("Credited interest {} to '{}'", delta, username);
                }
                Ok(_) => {}
                Err(e) => warn!("Interest for '{}' skipped: {}", username, e),
            }
        }

        let deposits_matured = self.engine.advance_all_by_one_period();
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "Tick {}: interest {} credited to {} account(s), {} deposit(s) matured",
            tick, interest_credited, accounts_credited, deposits_matured
        );

        TickReport {
            tick,
            accounts_credited,
            interest_credited,
            deposits_matured,
        }
    }

    /// Every account with its deposits, ordered by username.
    ///
    /// Taken under the deposit book lock, so no open or redeem is half visible.
    pub fn export_all(&self) -> Vec<AccountRecord> {
        self.engine.with_book(|book| {
            self.store
                .usernames()
                .into_iter()
                .filter_map(|username| self.store.snapshot(&username).ok())
                .map(|account| AccountRecord {
                    deposits: book
                        .values()
                        .filter(|deposit| deposit.owner() == account.username())
                        .map(DepositRecord::from)
                        .collect(),
                    username: account.username().to_string(),
                    display_name: account.display_name().to_string(),
                    balance: account.balance(),
                    credential: account.credential().to_string(),
                })
                .collect()
        })
    }

    /// Rebuilds state from exported records.
    ///
    /// Only valid on an empty ledger, before any accrual tick. All records are
    /// validated before anything is inserted, and the emptiness check and the
    /// inserts happen under the same locks.
    pub fn import_all(&self, records: Vec<AccountRecord>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut deposit_ids = HashSet::new();
        let mut accounts = Vec::with_capacity(records.len());
        let mut deposits = Vec::new();
        for record in records {
            let account = Account::with_balance(
                &record.username,
                &record.display_name,
                &record.credential,
                record.balance,
            )?;
            if !seen.insert(account.username().to_string()) {
                return Err(LedgerError::DuplicateAccount(account.username().to_string()));
            }
            for deposit in &record.deposits {
                if !deposit_ids.insert(deposit.id) {
                    return Err(LedgerError::DuplicateDeposit(deposit.id));
                }
                deposits.push(deposit.to_deposit(account.username())?);
            }
            accounts.push(account);
        }

        let account_count = accounts.len();
        let deposit_count = deposits.len();
        self.engine
            .restore_with(deposits, || self.store.insert_all(accounts))?;

        info!(
            "Imported {} account(s) and {} term deposit(s)",
            account_count, deposit_count
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deposit::DepositState;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn ledger() -> Ledger {
        let ledger = Ledger::new(LedgerConfig::default());
        ledger.register_account("alice", "Alice", "pw").unwrap();
        ledger.deposit("alice", money("2000.00")).unwrap();
        ledger
    }

    #[test]
    fn test_term_deposit_lifecycle_through_the_facade() {
        let ledger = ledger();
        let deposit = ledger.open_term_deposit("alice", money("1000.00"), 24).unwrap();
        assert_eq!(ledger.balance("alice").unwrap(), money("1000.00"));

        ledger.run_accrual_tick();
        let active = ledger.list_active_deposits("alice").unwrap();
        assert_eq!(active[0].state(), DepositState::Accruing);
        assert!(matches!(
            ledger.redeem_term_deposit("alice", deposit.id()),
            Err(LedgerError::NotMature { remaining: 1, .. })
        ));

        ledger.run_accrual_tick();
        ledger.redeem_term_deposit("alice", deposit.id()).unwrap();
        assert!(ledger.list_active_deposits("alice").unwrap().is_empty());
    }

    #[test]
    fn test_tick_credits_savings_interest() {
        let ledger = ledger();
        ledger.register_account("bob", "Bob", "pw").unwrap();

        let report = ledger.run_accrual_tick();
        assert_eq!(report.tick, 1);
        assert_eq!(report.accounts_credited, 1);
        assert_eq!(report.interest_credited, money("40.00"));
        assert_eq!(ledger.balance("alice").unwrap(), money("2040.00"));
        assert_eq!(ledger.balance("bob").unwrap(), Money::ZERO);
        assert_eq!(ledger.ticks_completed(), 1);
    }

    #[test]
    fn test_redeem_rejects_foreign_deposit() {
        let ledger = ledger();
        ledger.register_account("bob", "Bob", "pw").unwrap();
        let deposit = ledger.open_term_deposit("alice", money("100.00"), 3).unwrap();
        ledger.run_accrual_tick();

        assert!(matches!(
            ledger.redeem_term_deposit("bob", deposit.id()),
            Err(LedgerError::NotFound(_))
        ));
        assert_eq!(ledger.balance("bob").unwrap(), Money::ZERO);
    }

    #[test]
    fn test_total_portfolio_value() {
        let ledger = ledger();
        ledger.open_term_deposit("alice", money("1000.00"), 36).unwrap();
        assert_eq!(ledger.total_portfolio_value("alice").unwrap(), money("2000.00"));

        // balance 1000.00 + 2% = 1020.00, deposit 1035.00
        ledger.run_accrual_tick();
        assert_eq!(ledger.total_portfolio_value("alice").unwrap(), money("2055.00"));
    }

    #[test]
    fn test_list_active_for_unknown_account() {
        let ledger = ledger();
        assert!(matches!(
            ledger.list_active_deposits("ghost"),
            Err(LedgerError::UnknownAccount(_))
        ));
    }

    #[test]
    fn test_export_import_round_trip() {
        let ledger = ledger();
        let first = ledger.open_term_deposit("alice", money("100.00"), 3).unwrap();
        ledger.open_term_deposit("alice", money("200.00"), 24).unwrap();
        ledger.run_accrual_tick();
        ledger.redeem_term_deposit("alice", first.id()).unwrap();

        let exported = ledger.export_all();
        let restored = Ledger::new(LedgerConfig::default());
        restored.import_all(exported.clone()).unwrap();

        assert_eq!(restored.export_all(), exported);
        let next = restored.open_term_deposit("alice", money("1.00"), 3).unwrap();
        assert_eq!(next.id(), 3);
    }

    #[test]
    fn test_import_requires_empty_ledger() {
        let ledger = ledger();
        assert!(matches!(
            ledger.import_all(Vec::new()),
            Err(LedgerError::ImportNotEmpty)
        ));
    }

    #[test]
    fn test_import_rejects_duplicates_without_partial_state() {
        let record = AccountRecord {
            username: "alice".into(),
            display_name: "Alice".into(),
            balance: money("1.00"),
            credential: "pw".into(),
            deposits: Vec::new(),
        };
        let ledger = Ledger::new(LedgerConfig::default());
        assert!(matches!(
            ledger.import_all(vec![record.clone(), record]),
            Err(LedgerError::DuplicateAccount(_))
        ));
        assert!(ledger.export_all().is_empty());
    }

    fn record(username: &str, deposit_ids: &[DepositId]) -> AccountRecord {
        AccountRecord {
            username: username.into(),
            display_name: username.to_uppercase(),
            balance: money("1.00"),
            credential: "pw".into(),
            deposits: deposit_ids
                .iter()
                .map(|&id| DepositRecord {
                    id,
                    principal: money("10.00"),
                    term_months: 12,
                    elapsed_periods: 0,
                    maturity_amount: money("10.25"),
                    redeemed: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_import_rejects_shared_deposit_id_without_partial_state() {
        let ledger = Ledger::new(LedgerConfig::default());
        assert!(matches!(
            ledger.import_all(vec![record("a", &[1]), record("b", &[1])]),
            Err(LedgerError::DuplicateDeposit(1))
        ));
        assert!(ledger.export_all().is_empty());

        ledger.import_all(vec![record("a", &[1])]).unwrap();
        assert_eq!(ledger.export_all().len(), 1);
    }

    #[test]
    fn test_import_rejects_deposit_id_with_no_successor() {
        let ledger = Ledger::new(LedgerConfig::default());
        assert!(matches!(
            ledger.import_all(vec![record("a", &[u64::MAX])]),
            Err(LedgerError::DepositIdOverflow(_))
        ));
        assert!(ledger.export_all().is_empty());
    }

    #[test]
    fn test_redeem_for_unknown_account() {
        let ledger = ledger();
        let deposit = ledger.open_term_deposit("alice", money("100.00"), 3).unwrap();
        assert!(matches!(
            ledger.redeem_term_deposit("ghost", deposit.id()),
            Err(LedgerError::UnknownAccount(_))
        ));
        assert!(matches!(
            ledger.redeem_term_deposit("ghost", 99),
            Err(LedgerError::UnknownAccount(_))
        ));
    }
}
