use examdesk_db::{
    catalog, create_enrollments_table, create_pool, fix_exam_student_id, migrate_exam_difficulty,
    migrate_users_table, ColumnChange, DbPool, DbRuntimeSettings, RebuildMode, RebuildOutcome,
    TableCreation,
};
use tempfile::TempDir;

/// A file-backed pool holding the schema as it looked before any of the
/// maintenance scripts ran.
fn legacy_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("legacy.db");
    let pool = create_pool(path.to_str().expect("utf-8 path"), DbRuntimeSettings::default())
        .expect("failed to create pool");

    let conn = pool.get().expect("failed to get connection");
    conn.execute_batch(
        "CREATE TABLE users (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             email VARCHAR(255) NOT NULL UNIQUE,
             password_hash VARCHAR(255) NOT NULL,
             role VARCHAR(50) NOT NULL DEFAULT 'student'
         );
         INSERT INTO users (id, email, password_hash) VALUES
             (1, 'a@example.edu', 'x'), (2, 'b@example.edu', 'x'), (3, 'c@example.edu', 'x');
         CREATE TABLE exams (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             student_id INTEGER NOT NULL,
             status VARCHAR(50) DEFAULT 'in_progress',
             final_grade REAL,
             final_explanation TEXT,
             created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
             completed_at DATETIME,
             FOREIGN KEY(student_id) REFERENCES users(id)
         );
         INSERT INTO exams (student_id, final_grade) VALUES (1, 88.0), (2, 72.5), (3, NULL);",
    )
    .expect("failed to create legacy schema");
    drop(conn);

    (dir, pool)
}

#[test]
fn maintenance_scripts_bring_legacy_schema_up_to_date() {
    let (_dir, pool) = legacy_pool();
    let conn = pool.get().expect("failed to get connection");

    let users = migrate_users_table(&conn).expect("users migration should succeed");
    assert!(users.iter().all(|c| matches!(c, ColumnChange::Added { .. })));

    let exams = migrate_exam_difficulty(&conn).expect("exams migration should succeed");
    assert_eq!(exams.len(), 1);

    let outcome =
        fix_exam_student_id(&conn, RebuildMode::Stepwise).expect("rebuild should succeed");
    let report = match outcome {
        RebuildOutcome::Rebuilt(report) => report,
        other => panic!("expected a rebuild, got {other:?}"),
    };
    assert_eq!(report.copied_rows, 3);
    assert!(report.copied_columns.contains(&"exam_difficulty".to_string()));
    assert_eq!(report.foreign_key_violations, 0);

    assert_eq!(
        create_enrollments_table(&conn).expect("enrollments should be created"),
        TableCreation::Created
    );

    // Pool connections enforce foreign keys; the rebuild must leave that on.
    let fk: i32 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .expect("should query foreign_keys");
    assert_eq!(fk, 1);

    conn.execute("INSERT INTO exams (student_id) VALUES (NULL)", [])
        .expect("exams without a student should now be accepted");
    let dangling = conn.execute("INSERT INTO exams (student_id) VALUES (42)", []);
    assert!(dangling.is_err(), "student_id must still reference users");
}

fn schema_snapshot(conn: &rusqlite::Connection) -> Vec<(String, Option<String>)> {
    let mut stmt = conn
        .prepare("SELECT name, sql FROM sqlite_master ORDER BY name")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}

#[test]
fn second_run_changes_nothing() {
    let (_dir, pool) = legacy_pool();
    let conn = pool.get().expect("failed to get connection");

    migrate_users_table(&conn).unwrap();
    migrate_exam_difficulty(&conn).unwrap();
    fix_exam_student_id(&conn, RebuildMode::Stepwise).unwrap();
    create_enrollments_table(&conn).unwrap();

    let before = schema_snapshot(&conn);

    assert!(migrate_users_table(&conn)
        .unwrap()
        .iter()
        .all(|c| matches!(c, ColumnChange::AlreadyPresent { .. })));
    assert!(migrate_exam_difficulty(&conn)
        .unwrap()
        .iter()
        .all(|c| matches!(c, ColumnChange::AlreadyPresent { .. })));
    assert_eq!(
        fix_exam_student_id(&conn, RebuildMode::Atomic).unwrap(),
        RebuildOutcome::AlreadyNullable
    );
    assert_eq!(
        create_enrollments_table(&conn).unwrap(),
        TableCreation::AlreadyExists
    );

    assert_eq!(schema_snapshot(&conn), before);
    assert_eq!(catalog::row_count(&conn, "exams").unwrap(), 3);
}
