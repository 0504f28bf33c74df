//! Term Ledger CLI
//!
//! Loads a snapshot CSV, optionally replays a command CSV against it, and
//! writes the resulting snapshot to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- snapshot.csv commands.csv > next_snapshot.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `LEDGER_INTEREST_RATE`: Savings rate credited per tick (default `0.02`)
//! - `LEDGER_TICK_MS`: Accrual tick interval in milliseconds (default `5000`)

use log::info;
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use term_ledger::{
    process_commands, read_snapshot, write_snapshot, Ledger, LedgerConfig, LedgerError, Result,
};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(LedgerError::MissingArgument);
    }

    let config = LedgerConfig::from_env()?;
    let ledger = Ledger::new(config);

    let snapshot = File::open(&args[1])?;
    ledger.import_all(read_snapshot(BufReader::new(snapshot))?)?;

    if let Some(commands_path) = args.get(2) {
        let commands = File::open(commands_path)?;
        let summary = process_commands(&ledger, BufReader::new(commands))?;
        info!(
            "Applied {} command(s), rejected {}",
            summary.applied, summary.rejected
        );
    }

    let stdout = io::stdout();
    let handle = stdout.lock();
    write_snapshot(&ledger.export_all(), handle)?;

    Ok(())
}
