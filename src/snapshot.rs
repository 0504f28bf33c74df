//! Snapshot records for export/import and their CSV codec.
//!
//! The ledger itself only produces and consumes [`AccountRecord`]s; the CSV
//! layout below is one way to persist them. Each account is one `account` row
//! followed, anywhere later in the file, by zero or more `deposit` rows with the
//! same username.

use crate::decimal::Money;
use crate::deposit::{DepositId, TermDeposit};
use crate::error::{LedgerError, Result};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::str::FromStr;

/// One account as exported from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub username: String,
    pub display_name: String,
    pub balance: Money,
    pub credential: String,

    /// Every deposit of the account, redeemed ones included, in creation order.
    pub deposits: Vec<DepositRecord>,
}

/// One term deposit as exported from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRecord {
    pub id: DepositId,
    pub principal: Money,
    pub term_months: u32,
    pub elapsed_periods: u32,
    pub maturity_amount: Money,
    pub redeemed: bool,
}

impl DepositRecord {
    /// Rebuilds the deposit for `owner`.
    ///
    /// The persisted maturity amount is kept as-is, even if the rate table has
    /// changed since the deposit was opened.
    pub fn to_deposit(&self, owner: &str) -> Result<TermDeposit> {
        TermDeposit::restore(
            self.id,
            owner,
            self.principal,
            self.term_months,
            self.elapsed_periods,
            self.maturity_amount,
            self.redeemed,
        )
    }
}

impl From<&TermDeposit> for DepositRecord {
    fn from(deposit: &TermDeposit) -> Self {
        DepositRecord {
            id: deposit.id(),
            principal: deposit.principal(),
            term_months: deposit.term_months(),
            elapsed_periods: deposit.elapsed_periods(),
            maturity_amount: deposit.maturity_amount(),
            redeemed: deposit.is_redeemed(),
        }
    }
}

/// Column names, in the order of [`SnapshotRow`]'s fields.
const HEADER: [&str; 11] = [
    "kind",
    "username",
    "name",
    "credential",
    "balance",
    "id",
    "principal",
    "term",
    "elapsed",
    "maturity",
    "redeemed",
];

/// Raw snapshot row as read from or written to CSV.
///
/// Fields not used by a row's `kind` are left empty.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotRow {
    /// `account` or `deposit`
    kind: String,
    username: String,
    name: Option<String>,
    credential: Option<String>,
    balance: Option<String>,
    id: Option<DepositId>,
    principal: Option<String>,
    term: Option<u32>,
    elapsed: Option<u32>,
    maturity: Option<String>,
    redeemed: Option<bool>,
}

/// Reads snapshot rows into account records, in file order.
///
/// Any malformed row fails the whole read with [`LedgerError::InvalidRecord`].
pub fn read_snapshot<R: Read>(reader: R) -> Result<Vec<AccountRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<AccountRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (row_idx, result) in csv_reader.deserialize::<SnapshotRow>().enumerate() {
        let row = row_idx + 2; // 1-indexed, accounting for header row
        let raw = result.map_err(|e| LedgerError::InvalidRecord {
            row,
            message: e.to_string(),
        })?;

        match raw.kind.to_lowercase().as_str() {
            "account" => {
                if index.contains_key(&raw.username) {
                    return Err(invalid(row, format!("account '{}' listed twice", raw.username)));
                }
                let balance = money(row, "balance", raw.balance)?;
                index.insert(raw.username.clone(), records.len());
                records.push(AccountRecord {
                    username: raw.username,
                    display_name: raw.name.unwrap_or_default(),
                    balance,
                    credential: raw.credential.unwrap_or_default(),
                    deposits: Vec::new(),
                });
            }
            "deposit" => {
                let position = *index.get(&raw.username).ok_or_else(|| {
                    invalid(row, format!("deposit for unknown account '{}'", raw.username))
                })?;
                let deposit = DepositRecord {
                    id: required(row, "id", raw.id)?,
                    principal: money(row, "principal", raw.principal)?,
                    term_months: required(row, "term", raw.term)?,
                    elapsed_periods: required(row, "elapsed", raw.elapsed)?,
                    maturity_amount: money(row, "maturity", raw.maturity)?,
                    redeemed: raw.redeemed.unwrap_or(false),
                };
                records[position].deposits.push(deposit);
            }
            other => return Err(invalid(row, format!("unknown row kind '{}'", other))),
        }
    }

    debug!("Read snapshot with {} account(s)", records.len());
    Ok(records)
}

/// Writes account records as snapshot CSV.
///
/// Each account row is immediately followed by its deposit rows.
pub fn write_snapshot<W: Write>(records: &[AccountRecord], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(HEADER)?;

    for record in records {
        csv_writer.serialize(SnapshotRow {
            kind: "account".into(),
            username: record.username.clone(),
            name: Some(record.display_name.clone()),
            credential: Some(record.credential.clone()),
            balance: Some(record.balance.to_string()),
            ..SnapshotRow::default()
        })?;

        for deposit in &record.deposits {
            csv_writer.serialize(SnapshotRow {
                kind: "deposit".into(),
                username: record.username.clone(),
                id: Some(deposit.id),
                principal: Some(deposit.principal.to_string()),
                term: Some(deposit.term_months),
                elapsed: Some(deposit.elapsed_periods),
                maturity: Some(deposit.maturity_amount.to_string()),
                redeemed: Some(deposit.redeemed),
                ..SnapshotRow::default()
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

fn invalid(row: usize, message: String) -> LedgerError {
    LedgerError::InvalidRecord { row, message }
}

fn required<T>(row: usize, field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| invalid(row, format!("missing {}", field)))
}

fn money(row: usize, field: &str, value: Option<String>) -> Result<Money> {
    let raw = required(row, field, value)?;
    Money::from_str(&raw).map_err(|_| invalid(row, format!("{} '{}' is not a number", field, raw)))
}
