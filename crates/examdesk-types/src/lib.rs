//! Shared row types for the examdesk data layer.
//!
//! The `users` table is read by the verification report and written by the
//! authentication service, so its row shape lives here where both the
//! database crate and its consumers can see it.

use std::fmt;

/// Account role stored in `users.role`.
///
/// The application only gives special meaning to students and teachers.
/// Any other label (for example `admin`) is kept verbatim so that rows
/// written by the web layer always load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// A student; owns a `student_id`.
    #[default]
    Student,
    /// A teacher; owns an `instructor_id`.
    Teacher,
    /// Any other role label.
    Other(String),
}

impl Role {
    /// Returns the label stored in the database for this role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a stored role label. Matching is exact, as in the database.
impl From<String> for Role {
    fn from(label: String) -> Self {
        match label.as_str() {
            "student" => Self::Student,
            "teacher" => Self::Teacher,
            _ => Self::Other(label),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// PHC-format password hash.
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    /// Institutional student number; only meaningful for students.
    pub student_id: Option<String>,
    /// Institutional instructor number; only meaningful for teachers.
    pub instructor_id: Option<String>,
}
