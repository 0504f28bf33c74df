//! # Term Ledger
//!
//! A banking ledger that stays consistent while foreground account operations
//! and a background accrual ticker mutate it concurrently.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 2 decimal places via `rust_decimal`; caller
//!   amounts are truncated, computed interest is rounded half-up
//! - **Per-account locking**: operations on one account are linearizable,
//!   operations on different accounts do not contend
//! - **Atomic term deposits**: the principal debit and the deposit record, and
//!   the payout credit and the redeemed flag, always change together
//! - **Cooperative stop**: the ticker never abandons a tick halfway
//!
//! ## Example
//!
//! ```
//! use std::str::FromStr;
//! use term_ledger::{Ledger, LedgerConfig, Money};
//!
//! let ledger = Ledger::new(LedgerConfig::default());
//! ledger.register_account("alice", "Alice", "secret").unwrap();
//! ledger.deposit("alice", Money::from_str("1500.00").unwrap()).unwrap();
//!
//! let deposit = ledger
//!     .open_term_deposit("alice", Money::from_str("1000.00").unwrap(), 12)
//!     .unwrap();
//! assert_eq!(deposit.maturity_amount().to_string(), "1025.00");
//!
//! ledger.run_accrual_tick();
//! ledger.redeem_term_deposit("alice", deposit.id()).unwrap();
//! // 500.00 + 10.00 savings interest + 1025.00 payout
//! assert_eq!(ledger.balance("alice").unwrap().to_string(), "1535.00");
//! ```

pub mod account;
pub mod command;
pub mod config;
pub mod decimal;
pub mod deposit;
pub mod engine;
pub mod error;
pub mod interest;
pub mod ledger;
pub mod scheduler;
pub mod snapshot;
pub mod store;

pub use account::Account;
pub use command::{process_commands, BatchSummary, Command, CommandRecord};
pub use config::LedgerConfig;
pub use decimal::Money;
pub use deposit::{DepositId, DepositState, TermDeposit};
pub use engine::TermDepositEngine;
pub use error::{LedgerError, Result};
pub use interest::InterestPolicy;
pub use ledger::{Ledger, TickReport};
pub use scheduler::AccrualScheduler;
pub use snapshot::{read_snapshot, write_snapshot, AccountRecord, DepositRecord};
pub use store::LedgerStore;
