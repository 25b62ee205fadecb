//! Idempotent `ALTER TABLE .. ADD COLUMN` sequences.

use rusqlite::Connection;

use super::MigrationError;
use crate::catalog::{self, quote_ident};

/// A column to add: its name and everything after the name in the
/// `ADD COLUMN` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub definition: &'static str,
}

/// What happened to one requested column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChange {
    Added { column: String },
    AlreadyPresent { column: String },
    /// The addition failed and was rolled back.
    Failed { column: String, error: String },
}

impl ColumnChange {
    pub fn column(&self) -> &str {
        match self {
            Self::Added { column }
            | Self::AlreadyPresent { column }
            | Self::Failed { column, .. } => column,
        }
    }
}

/// Profile columns added to `users` after the first release.
pub const USER_PROFILE_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec {
        name: "first_name",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
    ColumnSpec {
        name: "last_name",
        definition: "TEXT NOT NULL DEFAULT ''",
    },
    ColumnSpec {
        name: "student_id",
        definition: "TEXT",
    },
    ColumnSpec {
        name: "instructor_id",
        definition: "TEXT",
    },
];

/// Free-form level label such as `Graduate` or `PhD`.
pub const EXAM_DIFFICULTY_COLUMNS: &[ColumnSpec] = &[ColumnSpec {
    name: "exam_difficulty",
    definition: "VARCHAR(80)",
}];

/// Adds each of `columns` to `table` unless it is already there.
///
/// Every column is checked and added in its own transaction. A failure on
/// one column is rolled back and reported as [`ColumnChange::Failed`]; the
/// remaining columns are still attempted.
///
/// # Errors
///
/// Returns [`MigrationError::TableNotFound`] when `table` does not exist and
/// [`MigrationError::Schema`] when the catalog cannot be read.
pub fn add_missing_columns(
    conn: &Connection,
    table: &str,
    columns: &[ColumnSpec],
) -> Result<Vec<ColumnChange>, MigrationError> {
    if !catalog::table_exists(conn, table).map_err(MigrationError::schema(table))? {
        return Err(MigrationError::TableNotFound(table.to_string()));
    }

    let mut changes = Vec::with_capacity(columns.len());

    for spec in columns {
        let column = spec.name.to_string();
        let change = match add_column(conn, table, spec) {
            Ok(true) => {
                tracing::info!(table, column = spec.name, "added column");
                ColumnChange::Added { column }
            }
            Ok(false) => {
                tracing::debug!(table, column = spec.name, "column already present, skipping");
                ColumnChange::AlreadyPresent { column }
            }
            Err(e) => {
                tracing::warn!(table, column = spec.name, error = %e, "failed to add column");
                ColumnChange::Failed {
                    column,
                    error: e.to_string(),
                }
            }
        };
        changes.push(change);
    }

    Ok(changes)
}

/// Returns `Ok(false)` when the column already exists.
fn add_column(conn: &Connection, table: &str, spec: &ColumnSpec) -> rusqlite::Result<bool> {
    // Dropping the transaction without commit rolls it back.
    let tx = conn.unchecked_transaction()?;

    if catalog::column_exists(&tx, table, spec.name)? {
        return Ok(false);
    }

    tx.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_ident(table),
        quote_ident(spec.name),
        spec.definition
    ))?;
    tx.commit()?;

    Ok(true)
}

/// Adds the profile columns (`first_name`, `last_name`, `student_id`,
/// `instructor_id`) to `users`.
pub fn migrate_users_table(conn: &Connection) -> Result<Vec<ColumnChange>, MigrationError> {
    add_missing_columns(conn, "users", USER_PROFILE_COLUMNS)
}

/// Adds the nullable `exam_difficulty` column to `exams`.
pub fn migrate_exam_difficulty(conn: &Connection) -> Result<Vec<ColumnChange>, MigrationError> {
    add_missing_columns(conn, "exams", EXAM_DIFFICULTY_COLUMNS)
}
