//! Queries against the `users` table.

use examdesk_types::{Role, User};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str =
    "id, email, password_hash, role, first_name, last_name, student_id, instructor_id";

/// Values for a new `users` row. The id is assigned by SQLite.
#[derive(Debug, Clone, Copy)]
pub struct UserInsert<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a Role,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub student_id: Option<&'a str>,
    pub instructor_id: Option<&'a str>,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: Role::from(role),
        // Rows written before the profile columns existed may hold NULL.
        first_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        last_name: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        student_id: row.get(6)?,
        instructor_id: row.get(7)?,
    })
}

/// Returns every user ordered by id.
pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Looks a user up by exact email match.
pub fn find_user_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        [email],
        user_from_row,
    )
    .optional()
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .optional()
}

/// Inserts a user and returns the new row id.
///
/// # Errors
///
/// A duplicate email surfaces as a `SQLITE_CONSTRAINT_UNIQUE` failure.
pub fn insert_user(conn: &Connection, user: &UserInsert<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (
            email, password_hash, role, first_name, last_name, student_id, instructor_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.first_name,
            user.last_name,
            user.student_id,
            user.instructor_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::USERS;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        conn.execute_batch(&USERS.create_sql()).expect("should create users");
        conn.execute_batch(&USERS.indexes[0].create_sql("users", true))
            .expect("should create email index");
        conn
    }

    fn insert(conn: &Connection, email: &str, role: &Role) -> rusqlite::Result<i64> {
        insert_user(
            conn,
            &UserInsert {
                email,
                password_hash: "$argon2id$placeholder",
                role,
                first_name: "Ada",
                last_name: "Lovelace",
                student_id: Some("S-1"),
                instructor_id: None,
            },
        )
    }

    #[test]
    fn insert_then_find_by_email_and_id() {
        let conn = test_db();
        let id = insert(&conn, "ada@example.edu", &Role::Student).expect("insert should succeed");

        let by_email = find_user_by_email(&conn, "ada@example.edu")
            .unwrap()
            .expect("user should exist");
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.role, Role::Student);
        assert_eq!(by_email.student_id.as_deref(), Some("S-1"));
        assert_eq!(by_email.instructor_id, None);

        let by_id = find_user_by_id(&conn, id).unwrap().expect("user should exist");
        assert_eq!(by_id, by_email);
    }

    #[test]
    fn email_lookup_is_exact() {
        let conn = test_db();
        insert(&conn, "ada@example.edu", &Role::Student).unwrap();
        assert!(find_user_by_email(&conn, "ADA@example.edu").unwrap().is_none());
        assert!(find_user_by_email(&conn, "nobody@example.edu").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let conn = test_db();
        insert(&conn, "ada@example.edu", &Role::Student).unwrap();
        let err = insert(&conn, "ada@example.edu", &Role::Teacher)
            .expect_err("duplicate email should fail");
        match err {
            rusqlite::Error::SqliteFailure(e, _) => {
                assert_eq!(e.extended_code, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_users_orders_by_id_and_keeps_unknown_roles() {
        let conn = test_db();
        insert(&conn, "b@example.edu", &Role::Other("admin".into())).unwrap();
        insert(&conn, "a@example.edu", &Role::Teacher).unwrap();

        let users = list_users(&conn).unwrap();
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["b@example.edu", "a@example.edu"]);
        assert_eq!(users[0].role, Role::Other("admin".into()));
    }

    #[test]
    fn null_names_load_as_empty() {
        let conn = test_db();
        conn.execute_batch(
            "DROP TABLE users;
             CREATE TABLE users (
                 id INTEGER PRIMARY KEY, email TEXT, password_hash TEXT, role TEXT,
                 first_name TEXT, last_name TEXT, student_id TEXT, instructor_id TEXT
             );
             INSERT INTO users (email, password_hash, role) VALUES ('old@example.edu', 'x', 'student');",
        )
        .unwrap();

        let users = list_users(&conn).unwrap();
        assert_eq!(users[0].first_name, "");
        assert_eq!(users[0].last_name, "");
    }
}
