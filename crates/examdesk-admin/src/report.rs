//! Console report of the `users` table.

use std::fmt;

use comfy_table::Table;
use examdesk_types::{Role, User};

/// A user whose profile is missing something the application requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    MissingFirstName { email: String },
    MissingLastName { email: String },
    StudentWithoutStudentId { email: String },
    TeacherWithoutInstructorId { email: String },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFirstName { email } => write!(f, "User {email} is missing first_name"),
            Self::MissingLastName { email } => write!(f, "User {email} is missing last_name"),
            Self::StudentWithoutStudentId { email } => {
                write!(f, "Student {email} is missing student_id")
            }
            Self::TeacherWithoutInstructorId { email } => {
                write!(f, "Teacher {email} is missing instructor_id")
            }
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Checks every user, in order, for missing required fields.
pub fn find_field_issues(users: &[User]) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    for user in users {
        let email = || user.email.clone();
        if is_blank(Some(user.first_name.as_str())) {
            issues.push(FieldIssue::MissingFirstName { email: email() });
        }
        if is_blank(Some(user.last_name.as_str())) {
            issues.push(FieldIssue::MissingLastName { email: email() });
        }
        match user.role {
            Role::Student if is_blank(user.student_id.as_deref()) => {
                issues.push(FieldIssue::StudentWithoutStudentId { email: email() })
            }
            Role::Teacher if is_blank(user.instructor_id.as_deref()) => {
                issues.push(FieldIssue::TeacherWithoutInstructorId { email: email() })
            }
            _ => {}
        }
    }

    issues
}

const USER_HEADERS: [&str; 7] = [
    "ID",
    "Email",
    "Role",
    "First Name",
    "Last Name",
    "Student ID",
    "Instructor ID",
];

/// Renders the users as a grid table; absent ids show as `N/A`.
pub fn render_user_table(users: &[User]) -> String {
    let or_na = |value: &Option<String>| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or("N/A")
            .to_string()
    };

    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|user| {
            vec![
                user.id.to_string(),
                user.email.clone(),
                user.role.to_string(),
                user.first_name.clone(),
                user.last_name.clone(),
                or_na(&user.student_id),
                or_na(&user.instructor_id),
            ]
        })
        .collect();

    render_grid(&USER_HEADERS, &rows)
}

/// Border set matching the classic `grid` layout: `+` at every
/// intersection, `=` under the header row.
const GRID: &str = "||--+=++|-+++++++++";

/// Renders `rows` under `headers` with `+---+` borders and `=` under the
/// header row. Cells are left-aligned and padded to their display width.
pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table.load_preset(GRID).set_header(headers.iter().copied());
    for row in rows {
        table.add_row(row.iter().map(String::as_str));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, email: &str, role: Role) -> User {
        User {
            id,
            email: email.to_string(),
            password_hash: String::new(),
            role,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            student_id: None,
            instructor_id: None,
        }
    }

    #[test]
    fn flags_each_missing_field() {
        let mut nameless = user(1, "s@example.edu", Role::Student);
        nameless.first_name.clear();
        nameless.last_name = "  ".into();
        let teacher = user(2, "t@example.edu", Role::Teacher);
        let mut complete = user(3, "ok@example.edu", Role::Student);
        complete.student_id = Some("S-1".into());
        let admin = user(4, "admin@example.edu", Role::Other("admin".into()));

        let issues = find_field_issues(&[nameless, teacher, complete, admin]);
        let messages: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            [
                "User s@example.edu is missing first_name",
                "User s@example.edu is missing last_name",
                "Student s@example.edu is missing student_id",
                "Teacher t@example.edu is missing instructor_id",
            ]
        );
    }

    #[test]
    fn empty_student_id_counts_as_missing() {
        let mut student = user(1, "s@example.edu", Role::Student);
        student.student_id = Some(String::new());
        assert_eq!(
            find_field_issues(&[student]),
            vec![FieldIssue::StudentWithoutStudentId {
                email: "s@example.edu".into()
            }]
        );
    }

    #[test]
    fn grid_layout() {
        let rendered = render_grid(
            &["ID", "Name"],
            &[
                vec!["1".into(), "Ada".into()],
                vec!["22".into(), "Grace Hopper".into()],
            ],
        );
        let expected = "\
+----+--------------+
| ID | Name         |
+====+==============+
| 1  | Ada          |
+----+--------------+
| 22 | Grace Hopper |
+----+--------------+";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn grid_pads_wide_characters_by_display_width() {
        let rendered = render_grid(&["Name"], &[vec!["李雷".into()]]);
        let expected = "\
+------+
| Name |
+======+
| 李雷 |
+------+";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn user_table_shows_na_for_absent_ids() {
        let mut teacher = user(7, "t@example.edu", Role::Teacher);
        teacher.instructor_id = Some("I-9".into());

        let table = render_user_table(&[teacher]);
        let row = table.lines().nth(3).expect("first data row");
        assert!(row.contains("| 7 "));
        assert!(row.contains("| teacher "));
        assert!(row.contains("| N/A "));
        assert!(row.contains("| I-9 "));
        assert!(table.lines().nth(1).unwrap().contains("Instructor ID"));
    }
}
