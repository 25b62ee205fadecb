//! Create-if-absent for model tables.

use rusqlite::Connection;

use super::MigrationError;
use crate::catalog;
use crate::schema::{TableDef, ENROLLMENTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCreation {
    Created,
    AlreadyExists,
}

/// Creates `table` and its indexes if the table is absent.
///
/// An existing table is left exactly as it is, indexes included. The
/// existence check, table and indexes share one transaction.
///
/// # Errors
///
/// Returns [`MigrationError::CreateTable`] if any statement fails.
pub fn create_table(
    conn: &Connection,
    table: &TableDef,
) -> Result<TableCreation, MigrationError> {
    let create_err = |source| MigrationError::CreateTable {
        table: table.name.to_string(),
        source,
    };

    let tx = conn.unchecked_transaction().map_err(create_err)?;
    let existed =
        catalog::table_exists(&tx, table.name).map_err(MigrationError::schema(table.name))?;
    if existed {
        tracing::debug!(table = table.name, "table already exists");
        return Ok(TableCreation::AlreadyExists);
    }

    tx.execute_batch(&table.create_sql()).map_err(create_err)?;
    for index in table.indexes {
        tx.execute_batch(&index.create_sql(table.name, true))
            .map_err(create_err)?;
    }
    tx.commit().map_err(create_err)?;

    tracing::info!(table = table.name, "created table");
    Ok(TableCreation::Created)
}

/// Creates the `enrollments` table.
pub fn create_enrollments_table(conn: &Connection) -> Result<TableCreation, MigrationError> {
    create_table(conn, &ENROLLMENTS)
}
