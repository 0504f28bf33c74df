//! Integration tests for the term-ledger CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Binary with ledger environment overrides cleared
fn ledger_cmd() -> Command {
    let mut cmd = Command::cargo_bin("term-ledger").unwrap();
    cmd.env_remove("LEDGER_INTEREST_RATE")
        .env_remove("LEDGER_TICK_MS");
    cmd
}

/// Run the binary with the given arguments and return stdout
fn run_ledger(args: &[&str]) -> String {
    let assert = ledger_cmd().args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Normalize CSV for comparison (sort lines, trim whitespace)
fn normalize_csv(csv: &str) -> Vec<String> {
    let mut lines: Vec<String> = csv
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    // Keep header first, sort the rest
    if lines.len() > 1 {
        let header = lines.remove(0);
        lines.sort();
        lines.insert(0, header);
    }

    lines
}

fn temp_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_sample_a_savings_and_term_deposit() {
    let output = run_ledger(&[
        &test_data_path("snapshot_a.csv"),
        &test_data_path("commands_a.csv"),
    ]);
    let expected = fs::read_to_string(test_data_path("expected_a.csv")).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_sample_b_restored_deposits() {
    let output = run_ledger(&[
        &test_data_path("snapshot_b.csv"),
        &test_data_path("commands_b.csv"),
    ]);
    let expected = fs::read_to_string(test_data_path("expected_b.csv")).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_snapshot_without_commands_round_trips() {
    let output = run_ledger(&[&test_data_path("snapshot_b.csv")]);
    let expected = fs::read_to_string(test_data_path("snapshot_b.csv")).unwrap();

    assert_eq!(output, expected);
}

#[test]
fn test_interest_rate_from_environment() {
    let commands = temp_csv("op,user,amount,term,deposit\ntick,,,,\ntick,,,,\n");

    ledger_cmd()
        .env("LEDGER_INTEREST_RATE", "0")
        .arg(test_data_path("snapshot_a.csv"))
        .arg(commands.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("account,alice,Alice,alice-pw,1000.00"))
        .stdout(predicate::str::contains("account,bob,Bob,bob-pw,50.00"));
}

#[test]
fn test_invalid_interest_rate_fails() {
    ledger_cmd()
        .env("LEDGER_INTEREST_RATE", "two percent")
        .arg(test_data_path("snapshot_a.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_argument() {
    ledger_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing snapshot argument"));
}

#[test]
fn test_nonexistent_file() {
    ledger_cmd()
        .arg("nonexistent_file.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_malformed_snapshot_fails_with_row_number() {
    let snapshot = temp_csv(
        "kind,username,name,credential,balance,id,principal,term,elapsed,maturity,redeemed\n\
         account,alice,Alice,pw,abc,,,,,,\n",
    );

    ledger_cmd()
        .arg(snapshot.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2"));
}

#[test]
fn test_rejected_commands_do_not_fail_the_run() {
    let commands = temp_csv(
        "op,user,amount,term,deposit\n\
         withdraw,alice,999999.00,,\n\
         deposit,ghost,1.00,,\n\
         open,alice,10.00,7,\n\
         deposit,alice,-4,,\n\
         withdraw,alice,0.50,,\n",
    );

    ledger_cmd()
        .arg(test_data_path("snapshot_a.csv"))
        .arg(commands.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("account,alice,Alice,alice-pw,999.50"))
        .stdout(predicate::str::contains("deposit,").not());
}
