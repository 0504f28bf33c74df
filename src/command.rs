//! Command records for batch replay through the ledger facade.

use crate::decimal::Money;
use crate::deposit::DepositId;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::Deserialize;
use std::io::Read;

/// Raw command record as read from CSV.
///
/// `amount` is used by deposit, withdraw and open; `term` by open; `deposit`
/// by redeem. A tick needs no other field.
#[derive(Debug, Deserialize)]
pub struct CommandRecord {
    /// Operation: deposit, withdraw, open, redeem, tick
    pub op: String,

    /// Account username
    pub user: Option<String>,

    /// Amount with up to 2 decimals (more are truncated)
    pub amount: Option<String>,

    /// Term deposit length in months
    pub term: Option<u32>,

    /// Term deposit id
    pub deposit: Option<DepositId>,
}

/// A validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Deposit { user: String, amount: Money },
    Withdraw { user: String, amount: Money },
    Open { user: String, amount: Money, term: u32 },
    Redeem { user: String, deposit: DepositId },
    Tick,
}

impl CommandRecord {
    /// Parses the raw CSV record into a typed command.
    pub fn parse(&self, row: usize) -> Result<Command> {
        let op = self.op.trim().to_lowercase();

        match op.as_str() {
            "deposit" => Ok(Command::Deposit {
                user: self.user(row)?,
                amount: self.amount(row)?,
            }),
            "withdraw" | "withdrawal" => Ok(Command::Withdraw {
                user: self.user(row)?,
                amount: self.amount(row)?,
            }),
            "open" => Ok(Command::Open {
                user: self.user(row)?,
                amount: self.amount(row)?,
                term: self.term.ok_or_else(|| missing(row, "term"))?,
            }),
            "redeem" => Ok(Command::Redeem {
                user: self.user(row)?,
                deposit: self.deposit.ok_or_else(|| missing(row, "deposit"))?,
            }),
            "tick" => Ok(Command::Tick),
            other => Err(LedgerError::InvalidRecord {
                row,
                message: format!("unknown operation '{}'", other),
            }),
        }
    }

    fn user(&self, row: usize) -> Result<String> {
        self.user
            .as_deref()
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(str::to_string)
            .ok_or_else(|| missing(row, "user"))
    }

    fn amount(&self, row: usize) -> Result<Money> {
        let raw = self.amount.as_deref().ok_or_else(|| missing(row, "amount"))?;
        Money::parse_amount(raw)
    }
}

fn missing(row: usize, field: &str) -> LedgerError {
    LedgerError::InvalidRecord {
        row,
        message: format!("missing {}", field),
    }
}

impl Command {
    /// Applies the command and describes the outcome.
    pub fn apply(&self, ledger: &Ledger) -> Result<String> {
        match self {
            Command::Deposit { user, amount } => {
                let balance = ledger.deposit(user, *amount)?;
                Ok(format!("Deposited {} to '{}', balance {}", amount, user, balance))
            }
            Command::Withdraw { user, amount } => {
                let balance = ledger.withdraw(user, *amount)?;
                Ok(format!("Withdrew {} from '{}', balance {}", amount, user, balance))
            }
            Command::Open { user, amount, term } => {
                let deposit = ledger.open_term_deposit(user, *amount, *term)?;
                Ok(format!("Term deposit created for '{}': {}", user, deposit))
            }
            Command::Redeem { user, deposit } => {
                let redeemed = ledger.redeem_term_deposit(user, *deposit)?;
                Ok(format!(
                    "Redeemed {} for '{}' (interest {})",
                    redeemed.maturity_amount(),
                    user,
                    redeemed.interest()
                ))
            }
            Command::Tick => {
                let report = ledger.run_accrual_tick();
                Ok(format!(
                    "Period {} passed, {} deposit(s) matured",
                    report.tick, report.deposits_matured
                ))
            }
        }
    }
}

/// Counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Replays commands from a CSV reader in streaming fashion.
///
/// Invalid or rejected commands are logged at warn level and skipped.
pub fn process_commands<R: Read>(ledger: &Ledger, reader: R) -> Result<BatchSummary> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut summary = BatchSummary::default();

    for (row_idx, result) in csv_reader.deserialize::<CommandRecord>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        let outcome = result
            .map_err(LedgerError::from)
            .and_then(|record| record.parse(row_num))
            .and_then(|command| command.apply(ledger));

        match outcome {
            Ok(message) => {
                summary.applied += 1;
                debug!("Row {}: {}", row_num, message);
            }
            Err(e) => {
                summary.rejected += 1;
                warn!("Row {}: {}", row_num, e);
            }
        }
    }

    Ok(summary)
}
