//! Status-line formatting for the maintenance scripts.

use std::error::Error;

use examdesk_db::{ColumnChange, IndexOutcome};

const RULE_WIDTH: usize = 80;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// A title framed by two rules.
pub fn banner(title: &str) -> String {
    format!("{rule}\n{title}\n{rule}", rule = rule())
}

pub fn column_change_line(change: &ColumnChange) -> String {
    match change {
        ColumnChange::Added { column } => format!("[+] Added column: {column}"),
        ColumnChange::AlreadyPresent { column } => {
            format!("[-] Column {column} already exists, skipping")
        }
        ColumnChange::Failed { column, error } => {
            format!("[X] Error adding column {column}: {error}")
        }
    }
}

pub fn index_outcome_line(outcome: &IndexOutcome) -> String {
    match outcome {
        IndexOutcome::Created { index } => format!("[OK] Index {index} created"),
        IndexOutcome::AlreadyPresent { index } => format!("[-] Index {index} already exists"),
        IndexOutcome::Failed { index, error } => {
            format!("[!] Index {index} could not be created: {error}")
        }
    }
}

/// Renders an error and its causes, one per line.
///
/// A cause whose message is already part of the message above it is
/// skipped.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut previous = out.clone();
    let mut source = err.source();

    while let Some(cause) = source {
        let message = cause.to_string();
        if !previous.contains(&message) {
            out.push_str("\n  caused by: ");
            out.push_str(&message);
        }
        previous = message;
        source = cause.source();
    }

    out
}
