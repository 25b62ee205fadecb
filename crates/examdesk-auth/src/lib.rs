//! Account authentication and signup for the examdesk web layer.
//!
//! Both functions take an open connection; the request layer owns the
//! session. Passwords are stored as Argon2id PHC strings with a random salt.
//! Stored values that are not PHC strings, such as plaintext left by older
//! releases, never verify.

mod password;

use examdesk_db::users::{self, UserInsert};
use examdesk_types::{Role, User};
use rusqlite::Connection;
use thiserror::Error;

pub use password::{hash_password, verify_password};

/// Errors from authentication and signup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A database operation failed.
    #[error("auth database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The password could not be hashed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Signup details for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    /// Kept only when `role` is [`Role::Student`].
    pub student_id: Option<String>,
    /// Kept only when `role` is [`Role::Teacher`].
    pub instructor_id: Option<String>,
}

impl NewUser {
    /// A student account with empty names and no ids.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role: Role::Student,
            first_name: String::new(),
            last_name: String::new(),
            student_id: None,
            instructor_id: None,
        }
    }
}

/// Returns the user with `email` if `password` matches their stored hash.
///
/// An unknown email and a wrong password both yield `Ok(None)`.
///
/// # Errors
///
/// Returns `AuthError::Database` if the lookup fails.
pub fn authenticate_user(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<Option<User>, AuthError> {
    let Some(user) = users::find_user_by_email(conn, email)? else {
        tracing::debug!("authentication failed: unknown email");
        return Ok(None);
    };

    if !verify_password(&user.password_hash, password) {
        tracing::debug!(user_id = user.id, "authentication failed: wrong password");
        return Ok(None);
    }

    Ok(Some(user))
}

/// Creates an account and returns the stored row.
///
/// Returns `Ok(None)` when the email is already registered, including when
/// a concurrent signup wins the race between the lookup and the insert.
/// `student_id` is stored only for students and `instructor_id` only for
/// teachers.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails and
/// `AuthError::Database` for any database failure other than a duplicate
/// email.
pub fn create_user(conn: &Connection, new_user: &NewUser) -> Result<Option<User>, AuthError> {
    if users::find_user_by_email(conn, &new_user.email)?.is_some() {
        tracing::debug!("signup rejected: email already registered");
        return Ok(None);
    }

    let password_hash = hash_password(&new_user.password)?;
    let student_id = match new_user.role {
        Role::Student => new_user.student_id.as_deref(),
        _ => None,
    };
    let instructor_id = match new_user.role {
        Role::Teacher => new_user.instructor_id.as_deref(),
        _ => None,
    };

    let tx = conn.unchecked_transaction()?;
    let inserted = users::insert_user(
        &tx,
        &UserInsert {
            email: &new_user.email,
            password_hash: &password_hash,
            role: &new_user.role,
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
            student_id,
            instructor_id,
        },
    );

    let id = match inserted {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            // Dropping `tx` rolls the insert back.
            tracing::debug!("signup rejected: email registered concurrently");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let user = users::find_user_by_id(&tx, id)?;
    tx.commit()?;

    if let Some(user) = &user {
        tracing::info!(user_id = user.id, role = %user.role, "created user");
    }
    Ok(user)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults_to_student() {
        let user = NewUser::new("a@example.edu", "pw");
        assert_eq!(user.role, Role::Student);
        assert!(user.first_name.is_empty());
        assert_eq!(user.student_id, None);
    }

    #[test]
    fn unique_violation_detection() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('x');")
            .unwrap();
        let dup = conn.execute("INSERT INTO t VALUES ('x')", []).unwrap_err();
        assert!(is_unique_violation(&dup));

        let other = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert!(!is_unique_violation(&other));
    }
}
