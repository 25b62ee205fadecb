//! One-shot schema maintenance operations.
//!
//! Each operation is independent: there is no version table and nothing
//! orders one against another. Every operation inspects the live schema
//! first, so running it again after it succeeded changes nothing.

mod columns;
mod create;
mod rebuild;

use thiserror::Error;

pub use columns::{
    add_missing_columns, migrate_exam_difficulty, migrate_users_table, ColumnChange, ColumnSpec,
    EXAM_DIFFICULTY_COLUMNS, USER_PROFILE_COLUMNS,
};
pub use create::{create_enrollments_table, create_table, TableCreation};
pub use rebuild::{
    fix_exam_student_id, relax_not_null, scratch_table_name, IndexOutcome, RebuildMode,
    RebuildOutcome, RebuildReport, RebuildStep,
};

/// Errors that end a maintenance operation.
///
/// Failures that an operation tolerates (a single column or index) are
/// reported in its outcome instead.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The table to migrate does not exist.
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// The column to migrate does not exist.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// Table that was inspected.
        table: String,
        /// Column that was expected.
        column: String,
    },

    /// Reading the live schema failed.
    #[error("failed to inspect schema of '{table}': {source}")]
    Schema {
        /// Table being inspected.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A step of a table rebuild failed.
    #[error("rebuild of '{table}' failed to {step}: {source}")]
    RebuildStep {
        /// Table being rebuilt.
        table: String,
        /// The step that failed.
        step: RebuildStep,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// The scratch table did not receive every row of the original.
    #[error("copying '{table}' produced {copied} rows, expected {expected}")]
    RowCountMismatch {
        /// Table being rebuilt.
        table: String,
        /// Rows in the original table.
        expected: i64,
        /// Rows in the scratch table.
        copied: i64,
    },

    /// Creating a model table failed.
    #[error("failed to create table '{table}': {source}")]
    CreateTable {
        /// Table being created.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },
}

impl MigrationError {
    pub(crate) fn schema(table: &str) -> impl FnOnce(rusqlite::Error) -> Self + '_ {
        move |source| Self::Schema {
            table: table.to_string(),
            source,
        }
    }
}
