//! Table rebuild that relaxes a `NOT NULL` column.
//!
//! SQLite cannot change a column's nullability in place, so the table is
//! rebuilt: a scratch table is created from the model definition, the rows
//! are copied across, the original is dropped and the scratch table takes
//! its name. Foreign-key enforcement is switched off on the session for the
//! duration so that dropping the original neither fails nor cascades into
//! child tables such as `enrollments`.
//!
//! The rebuild needs exclusive access to the table. In
//! [`RebuildMode::Stepwise`] every step commits on its own and a failure
//! part way leaves the database partially migrated; re-running starts by
//! discarding the stale scratch table. [`RebuildMode::Atomic`] runs the
//! steps in a single transaction instead.

use std::fmt;

use rusqlite::Connection;

use super::MigrationError;
use crate::catalog::{self, quote_ident, ColumnInfo};
use crate::schema::{TableDef, EXAMS};

/// How the rebuild steps are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildMode {
    /// Commit after every step.
    #[default]
    Stepwise,
    /// Run every step in one transaction.
    Atomic,
}

/// A step of the rebuild, used to report where it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildStep {
    ToggleForeignKeys,
    BeginTransaction,
    CreateScratch,
    CopyRows,
    DropOriginal,
    RenameScratch,
    Commit,
}

impl fmt::Display for RebuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToggleForeignKeys => "toggle foreign key enforcement",
            Self::BeginTransaction => "begin transaction",
            Self::CreateScratch => "create scratch table",
            Self::CopyRows => "copy rows",
            Self::DropOriginal => "drop original table",
            Self::RenameScratch => "rename scratch table",
            Self::Commit => "commit",
        })
    }
}

/// What happened to one model index after the rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Created { index: String },
    AlreadyPresent { index: String },
    Failed { index: String, error: String },
}

/// Details of a completed rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub table: String,
    /// Columns found in the table before the rebuild.
    pub original_columns: Vec<String>,
    /// Columns copied from the original table.
    pub copied_columns: Vec<String>,
    /// Model columns the original lacked; they hold their default (SQL NULL
    /// when none is declared).
    pub defaulted_columns: Vec<String>,
    /// Columns the model does not know about, carried over as declared.
    pub carried_columns: Vec<String>,
    pub copied_rows: usize,
    pub indexes: Vec<IndexOutcome>,
    /// Rows violating a foreign key after the rebuild. Only checked when
    /// enforcement was on for the session.
    pub foreign_key_violations: usize,
    /// Error from dropping a stale scratch table, if that failed.
    pub scratch_cleanup_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The column already accepts NULL; nothing was changed.
    AlreadyNullable,
    Rebuilt(RebuildReport),
}

/// Name of the scratch table used while rebuilding `table`.
pub fn scratch_table_name(table: &str) -> String {
    format!("{table}_new")
}

/// Makes `exams.student_id` nullable.
pub fn fix_exam_student_id(
    conn: &Connection,
    mode: RebuildMode,
) -> Result<RebuildOutcome, MigrationError> {
    relax_not_null(conn, &EXAMS, "student_id", mode)
}

/// Rebuilds `table` into its model definition if `column` is currently
/// `NOT NULL`.
///
/// The model definition must declare `column` as nullable. Must be called
/// outside of any open transaction.
///
/// # Errors
///
/// [`MigrationError::TableNotFound`], [`MigrationError::ColumnNotFound`] and
/// [`MigrationError::Schema`] are raised before anything is changed.
/// [`MigrationError::RebuildStep`] and [`MigrationError::RowCountMismatch`]
/// name the step that failed; in stepwise mode earlier steps stay committed.
pub fn relax_not_null(
    conn: &Connection,
    table: &TableDef,
    column: &str,
    mode: RebuildMode,
) -> Result<RebuildOutcome, MigrationError> {
    if !catalog::table_exists(conn, table.name).map_err(MigrationError::schema(table.name))? {
        return Err(MigrationError::TableNotFound(table.name.to_string()));
    }

    let live =
        catalog::table_columns(conn, table.name).map_err(MigrationError::schema(table.name))?;
    let target = live
        .iter()
        .find(|c| c.name == column)
        .ok_or_else(|| MigrationError::ColumnNotFound {
            table: table.name.to_string(),
            column: column.to_string(),
        })?;

    if !target.not_null {
        tracing::debug!(table = table.name, column, "column already nullable");
        return Ok(RebuildOutcome::AlreadyNullable);
    }

    tracing::info!(
        table = table.name,
        column,
        ?mode,
        "column is NOT NULL, rebuilding table"
    );

    let plan = RebuildPlan::new(table, column, &live);
    let step_err = |step| {
        move |source| MigrationError::RebuildStep {
            table: table.name.to_string(),
            step,
            source,
        }
    };

    let enforced: bool = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .map_err(step_err(RebuildStep::ToggleForeignKeys))?;
    if enforced {
        conn.execute_batch("PRAGMA foreign_keys = OFF")
            .map_err(step_err(RebuildStep::ToggleForeignKeys))?;
    }

    let result = match mode {
        RebuildMode::Stepwise => execute_plan(conn, table, &plan),
        RebuildMode::Atomic => execute_atomic(conn, table, &plan),
    };

    if enforced {
        let restored = conn.execute_batch("PRAGMA foreign_keys = ON");
        match (&result, restored) {
            (Ok(_), Err(e)) => return Err(step_err(RebuildStep::ToggleForeignKeys)(e)),
            (Err(_), Err(e)) => {
                tracing::warn!(error = %e, "failed to restore foreign key enforcement")
            }
            (_, Ok(())) => {}
        }
    }

    let mut report = result?;

    if enforced {
        match foreign_key_violations(conn, table.name) {
            Ok(0) => {}
            Ok(n) => {
                tracing::warn!(table = table.name, violations = n, "foreign key check failed");
                report.foreign_key_violations = n;
            }
            Err(e) => tracing::warn!(error = %e, "foreign key check could not run"),
        }
    }

    tracing::info!(
        table = table.name,
        rows = report.copied_rows,
        "rebuild complete"
    );

    Ok(RebuildOutcome::Rebuilt(report))
}

/// Statements and column lists worked out from the live schema.
struct RebuildPlan {
    scratch: String,
    create_sql: String,
    original_columns: Vec<String>,
    copied_columns: Vec<String>,
    defaulted_columns: Vec<String>,
    carried_columns: Vec<String>,
}

impl RebuildPlan {
    fn new(table: &TableDef, relaxed: &str, live: &[ColumnInfo]) -> Self {
        let scratch = scratch_table_name(table.name);
        let is_live = |name: &str| live.iter().any(|c| c.name == name);

        let mut copied_columns = Vec::new();
        let mut defaulted_columns = Vec::new();
        for name in table.column_names() {
            if is_live(name) {
                copied_columns.push(name.to_string());
            } else {
                defaulted_columns.push(name.to_string());
            }
        }

        let mut carried_columns = Vec::new();
        let mut extra_decls = Vec::new();
        for info in live.iter().filter(|c| table.column(&c.name).is_none()) {
            extra_decls.push(carried_decl(info, info.name == relaxed));
            carried_columns.push(info.name.clone());
            copied_columns.push(info.name.clone());
        }

        Self {
            create_sql: table.render_create(&scratch, false, &extra_decls),
            scratch,
            original_columns: live.iter().map(|c| c.name.clone()).collect(),
            copied_columns,
            defaulted_columns,
            carried_columns,
        }
    }

    fn copy_sql(&self, table: &str) -> String {
        let columns: Vec<String> = self.copied_columns.iter().map(|c| quote_ident(c)).collect();
        let columns = columns.join(", ");
        format!(
            "INSERT INTO {scratch} ({columns}) SELECT {columns} FROM {table}",
            scratch = quote_ident(&self.scratch),
            table = quote_ident(table),
        )
    }
}

/// Declaration for a live column the model does not define.
fn carried_decl(info: &ColumnInfo, relax: bool) -> String {
    let mut decl = quote_ident(&info.name);
    if !info.decl_type.is_empty() {
        decl.push(' ');
        decl.push_str(&info.decl_type);
    }
    if info.not_null && !relax {
        decl.push_str(" NOT NULL");
    }
    if let Some(default) = &info.default_value {
        decl.push_str(" DEFAULT ");
        decl.push_str(default);
    }
    decl
}

fn execute_atomic(
    conn: &Connection,
    table: &TableDef,
    plan: &RebuildPlan,
) -> Result<RebuildReport, MigrationError> {
    let step_err = |step| {
        move |source| MigrationError::RebuildStep {
            table: table.name.to_string(),
            step,
            source,
        }
    };

    let tx = conn
        .unchecked_transaction()
        .map_err(step_err(RebuildStep::BeginTransaction))?;
    let report = execute_plan(&tx, table, plan)?;
    tx.commit().map_err(step_err(RebuildStep::Commit))?;

    Ok(report)
}

/// Runs the rebuild statements on `conn`. Outside a transaction each
/// statement commits as it completes.
fn execute_plan(
    conn: &Connection,
    table: &TableDef,
    plan: &RebuildPlan,
) -> Result<RebuildReport, MigrationError> {
    let step_err = |step| {
        move |source| MigrationError::RebuildStep {
            table: table.name.to_string(),
            step,
            source,
        }
    };
    let quoted_table = quote_ident(table.name);
    let quoted_scratch = quote_ident(&plan.scratch);

    let scratch_cleanup_error =
        match conn.execute_batch(&format!("DROP TABLE IF EXISTS {quoted_scratch}")) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    scratch = %plan.scratch,
                    error = %e,
                    "could not drop stale scratch table"
                );
                Some(e.to_string())
            }
        };

    tracing::info!(scratch = %plan.scratch, "creating scratch table");
    conn.execute_batch(&plan.create_sql)
        .map_err(step_err(RebuildStep::CreateScratch))?;

    let copied_rows = conn
        .execute(&plan.copy_sql(table.name), [])
        .map_err(step_err(RebuildStep::CopyRows))?;

    let expected = catalog::row_count(conn, table.name).map_err(step_err(RebuildStep::CopyRows))?;
    let copied = catalog::row_count(conn, &plan.scratch).map_err(step_err(RebuildStep::CopyRows))?;
    if expected != copied {
        return Err(MigrationError::RowCountMismatch {
            table: table.name.to_string(),
            expected,
            copied,
        });
    }
    tracing::info!(
        rows = copied_rows,
        columns = plan.copied_columns.len(),
        "copied rows into scratch table"
    );

    conn.execute_batch(&format!("DROP TABLE {quoted_table}"))
        .map_err(step_err(RebuildStep::DropOriginal))?;

    conn.execute_batch(&format!("ALTER TABLE {quoted_scratch} RENAME TO {quoted_table}"))
        .map_err(step_err(RebuildStep::RenameScratch))?;

    let indexes = table
        .indexes
        .iter()
        .map(|index| {
            let name = index.name.to_string();
            let created = catalog::index_exists(conn, index.name).and_then(|exists| {
                if exists {
                    return Ok(false);
                }
                conn.execute_batch(&index.create_sql(table.name, false))
                    .map(|()| true)
            });
            match created {
                Ok(true) => IndexOutcome::Created { index: name },
                Ok(false) => IndexOutcome::AlreadyPresent { index: name },
                Err(e) => {
                    tracing::warn!(index = index.name, error = %e, "failed to recreate index");
                    IndexOutcome::Failed {
                        index: name,
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect();

    Ok(RebuildReport {
        table: table.name.to_string(),
        original_columns: plan.original_columns.clone(),
        copied_columns: plan.copied_columns.clone(),
        defaulted_columns: plan.defaulted_columns.clone(),
        carried_columns: plan.carried_columns.clone(),
        copied_rows,
        indexes,
        foreign_key_violations: 0,
        scratch_cleanup_error,
    })
}

fn foreign_key_violations(conn: &Connection, table: &str) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_check({})", quote_ident(table)))?;
    let mut rows = stmt.query([])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}
