//! Error types for the ledger.

use crate::decimal::Money;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Non-positive or malformed monetary value
    #[error("Invalid amount '{0}'. Use up to 2 decimals and > 0")]
    InvalidAmount(String),

    /// Withdrawal or term deposit exceeds the available balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// Term length not present in the interest policy
    #[error("Invalid term of {0} months")]
    InvalidTerm(u32),

    /// Unknown term deposit id
    #[error("Term deposit {0} not found")]
    NotFound(u64),

    /// Two term deposits share an id
    #[error("Term deposit id {0} is used more than once")]
    DuplicateDeposit(u64),

    /// No deposit id is left to hand out after this one
    #[error("Term deposit id {0} leaves no room for further deposits")]
    DepositIdOverflow(u64),

    /// Term deposit already paid out
    #[error("Term deposit {0} has already been redeemed")]
    AlreadyRedeemed(u64),

    /// Term deposit has not served its full term yet
    #[error("Term deposit {id} not yet mature: {remaining} more period(s) required")]
    NotMature { id: u64, remaining: u32 },

    /// Unknown account username
    #[error("Unknown account '{0}'")]
    UnknownAccount(String),

    /// Username already registered
    #[error("Account '{0}' already exists")]
    DuplicateAccount(String),

    /// Blank or otherwise unusable account details
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Credential mismatch or blank replacement credential
    #[error("Invalid credential for account '{0}'")]
    InvalidCredential(String),

    /// Snapshot import attempted on a ledger that already holds accounts
    #[error("Cannot import into a ledger that already holds accounts")]
    ImportNotEmpty,

    /// Internal invariant broken; the offending operation was aborted
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid snapshot or command record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing input file argument
    #[error("Missing snapshot argument. Usage: term-ledger <snapshot.csv> [commands.csv]")]
    MissingArgument,
}

impl LedgerError {
    /// Returns `true` for failures a caller can report and move past.
    ///
    /// Only invariant violations indicate a ledger bug.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LedgerError::InvariantViolation(_))
    }
}
