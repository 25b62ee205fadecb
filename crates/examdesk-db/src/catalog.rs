//! Live schema introspection.
//!
//! Every lookup goes through `sqlite_master` or a pragma table-valued
//! function with the table and column names bound as parameters. Only
//! [`row_count`] has to splice an identifier, and it quotes it.

use rusqlite::{params, Connection};

/// One row of `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Zero-based column position.
    pub cid: i64,
    /// Column name.
    pub name: String,
    /// Declared type as written in the `CREATE TABLE` statement.
    pub decl_type: String,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// Default expression as SQL text, e.g. `'in_progress'`.
    pub default_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it.
    pub primary_key: i64,
}

/// One column mapping of `pragma_foreign_key_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    /// Referencing column in the child table.
    pub from: String,
    /// Referenced parent table.
    pub table: String,
    /// `None` when the reference targets the parent's primary key implicitly.
    pub to: Option<String>,
}

/// Quotes an SQL identifier with double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns whether a table named `table` exists.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )
}

/// Returns whether an index named `index` exists on any table.
pub fn index_exists(conn: &Connection, index: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1)",
        [index],
        |row| row.get(0),
    )
}

/// Returns whether `table` currently has a column named `column`.
///
/// A missing table has no columns, so this returns `false` for it.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = ?2",
        params![table, column],
        |row| row.get(0),
    )
}

/// Lists the columns of `table` in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT cid, name, \"type\", \"notnull\", dflt_value, pk
         FROM pragma_table_info(?1)
         ORDER BY cid",
    )?;
    let rows = stmt.query_map([table], |row| {
        Ok(ColumnInfo {
            cid: row.get(0)?,
            name: row.get(1)?,
            decl_type: row.get(2)?,
            not_null: row.get(3)?,
            default_value: row.get(4)?,
            primary_key: row.get(5)?,
        })
    })?;

    rows.collect()
}

/// Lists the foreign-key column mappings declared on `table`.
pub fn foreign_keys(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\"
         FROM pragma_foreign_key_list(?1)
         ORDER BY id, seq",
    )?;
    let rows = stmt.query_map([table], |row| {
        Ok(ForeignKeyInfo {
            from: row.get(0)?,
            table: row.get(1)?,
            to: row.get(2)?,
        })
    })?;

    rows.collect()
}

/// Counts the rows in `table`.
pub fn row_count(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_probe() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE probe (
                 id INTEGER PRIMARY KEY,
                 label TEXT NOT NULL DEFAULT 'x',
                 parent_id INTEGER REFERENCES parent(id)
             );
             CREATE INDEX ix_probe_label ON probe(label);
             INSERT INTO probe (label) VALUES ('a'), ('b');",
        )
        .expect("should create probe tables");
        conn
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("exams"), "\"exams\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn detects_tables_indexes_and_columns() {
        let conn = conn_with_probe();

        assert!(table_exists(&conn, "probe").unwrap());
        assert!(!table_exists(&conn, "missing").unwrap());
        assert!(index_exists(&conn, "ix_probe_label").unwrap());
        assert!(!index_exists(&conn, "ix_missing").unwrap());
        assert!(column_exists(&conn, "probe", "label").unwrap());
        assert!(!column_exists(&conn, "probe", "nope").unwrap());
        assert!(!column_exists(&conn, "missing", "label").unwrap());
    }

    #[test]
    fn table_columns_reports_nullability_and_defaults() {
        let conn = conn_with_probe();
        let columns = table_columns(&conn, "probe").unwrap();

        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "label", "parent_id"]);

        assert_eq!(columns[0].primary_key, 1);
        assert!(columns[1].not_null);
        assert_eq!(columns[1].default_value.as_deref(), Some("'x'"));
        assert_eq!(columns[1].decl_type, "TEXT");
        assert!(!columns[2].not_null);
        assert_eq!(columns[2].default_value, None);
    }

    #[test]
    fn foreign_keys_and_row_count() {
        let conn = conn_with_probe();

        let fks = foreign_keys(&conn, "probe").unwrap();
        assert_eq!(
            fks,
            vec![ForeignKeyInfo {
                from: "parent_id".into(),
                table: "parent".into(),
                to: Some("id".into()),
            }]
        );
        assert_eq!(row_count(&conn, "probe").unwrap(), 2);
    }
}
