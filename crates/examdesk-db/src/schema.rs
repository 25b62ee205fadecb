//! Model table definitions.
//!
//! These are the shapes the web application expects. The maintenance
//! operations create tables from them and rebuild tables into them.

use crate::catalog::quote_ident;

/// A column of a model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    /// Type and column constraints, e.g. `VARCHAR(50) DEFAULT 'in_progress'`.
    pub decl: &'static str,
}

/// A named index over one or more columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    /// Renders the `CREATE INDEX` statement for this index on `table`.
    pub fn create_sql(&self, table: &str, if_not_exists: bool) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE {unique}INDEX {guard}{name} ON {table} ({columns})",
            unique = if self.unique { "UNIQUE " } else { "" },
            guard = if if_not_exists { "IF NOT EXISTS " } else { "" },
            name = quote_ident(self.name),
            table = quote_ident(table),
            columns = columns.join(", "),
        )
    }
}

/// A model table: ordered columns, table constraints and indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    /// Table-level constraints such as `FOREIGN KEY(..) REFERENCES ..`.
    pub constraints: &'static [&'static str],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    /// Renders `CREATE TABLE IF NOT EXISTS` for this model.
    pub fn create_sql(&self) -> String {
        self.render_create(self.name, true, &[])
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Renders a `CREATE TABLE` under `table_name`, with `extra_columns`
    /// (already rendered `name decl` fragments) placed after the model
    /// columns and before the table constraints.
    pub(crate) fn render_create(
        &self,
        table_name: &str,
        if_not_exists: bool,
        extra_columns: &[String],
    ) -> String {
        let body: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(c.name), c.decl))
            .chain(extra_columns.iter().cloned())
            .chain(self.constraints.iter().map(|c| c.to_string()))
            .collect();

        format!(
            "CREATE TABLE {guard}{name} (\n    {body}\n)",
            guard = if if_not_exists { "IF NOT EXISTS " } else { "" },
            name = quote_ident(table_name),
            body = body.join(",\n    "),
        )
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef {
            name: "id",
            decl: "INTEGER PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "email",
            decl: "VARCHAR(255) NOT NULL",
        },
        ColumnDef {
            name: "password_hash",
            decl: "VARCHAR(255) NOT NULL",
        },
        ColumnDef {
            name: "role",
            decl: "VARCHAR(50) NOT NULL DEFAULT 'student'",
        },
        ColumnDef {
            name: "first_name",
            decl: "TEXT NOT NULL DEFAULT ''",
        },
        ColumnDef {
            name: "last_name",
            decl: "TEXT NOT NULL DEFAULT ''",
        },
        ColumnDef {
            name: "student_id",
            decl: "TEXT",
        },
        ColumnDef {
            name: "instructor_id",
            decl: "TEXT",
        },
    ],
    constraints: &[],
    indexes: &[IndexDef {
        name: "ix_users_email",
        columns: &["email"],
        unique: true,
    }],
};

/// Exam records. Exam metadata is required by the application but nullable
/// here so that rows from older schemas survive a rebuild.
pub const EXAMS: TableDef = TableDef {
    name: "exams",
    columns: &[
        ColumnDef {
            name: "id",
            decl: "INTEGER PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "exam_id",
            decl: "VARCHAR(100) UNIQUE",
        },
        ColumnDef {
            name: "course_number",
            decl: "VARCHAR(20)",
        },
        ColumnDef {
            name: "section",
            decl: "VARCHAR(10)",
        },
        ColumnDef {
            name: "exam_name",
            decl: "VARCHAR(100)",
        },
        ColumnDef {
            name: "quarter_year",
            decl: "VARCHAR(20)",
        },
        ColumnDef {
            name: "instructor_name",
            decl: "VARCHAR(200)",
        },
        ColumnDef {
            name: "instructor_id",
            decl: "INTEGER",
        },
        ColumnDef {
            name: "date_start",
            decl: "DATETIME",
        },
        ColumnDef {
            name: "date_end",
            decl: "DATETIME",
        },
        ColumnDef {
            name: "date_published",
            decl: "DATETIME",
        },
        ColumnDef {
            name: "date_end_availability",
            decl: "DATETIME",
        },
        ColumnDef {
            name: "student_id",
            decl: "INTEGER",
        },
        ColumnDef {
            name: "status",
            decl: "VARCHAR(50) DEFAULT 'in_progress'",
        },
        ColumnDef {
            name: "final_grade",
            decl: "REAL",
        },
        ColumnDef {
            name: "final_explanation",
            decl: "TEXT",
        },
        ColumnDef {
            name: "exam_difficulty",
            decl: "VARCHAR(80)",
        },
        ColumnDef {
            name: "created_at",
            decl: "DATETIME DEFAULT CURRENT_TIMESTAMP",
        },
        ColumnDef {
            name: "completed_at",
            decl: "DATETIME",
        },
    ],
    constraints: &[
        "FOREIGN KEY(student_id) REFERENCES users(id)",
        "FOREIGN KEY(instructor_id) REFERENCES users(id)",
    ],
    indexes: &[
        IndexDef {
            name: "ix_exams_exam_id",
            columns: &["exam_id"],
            unique: false,
        },
        IndexDef {
            name: "ix_exams_course_number",
            columns: &["course_number"],
            unique: false,
        },
        IndexDef {
            name: "ix_exams_instructor_id",
            columns: &["instructor_id"],
            unique: false,
        },
    ],
};

pub const ENROLLMENTS: TableDef = TableDef {
    name: "enrollments",
    columns: &[
        ColumnDef {
            name: "id",
            decl: "INTEGER PRIMARY KEY AUTOINCREMENT",
        },
        ColumnDef {
            name: "student_id",
            decl: "INTEGER NOT NULL",
        },
        ColumnDef {
            name: "exam_id",
            decl: "INTEGER NOT NULL",
        },
        ColumnDef {
            name: "enrolled_at",
            decl: "DATETIME DEFAULT CURRENT_TIMESTAMP",
        },
    ],
    constraints: &[
        "FOREIGN KEY(student_id) REFERENCES users(id) ON DELETE CASCADE",
        "FOREIGN KEY(exam_id) REFERENCES exams(id) ON DELETE CASCADE",
        "UNIQUE(student_id, exam_id)",
    ],
    indexes: &[
        IndexDef {
            name: "ix_enrollments_student_id",
            columns: &["student_id"],
            unique: false,
        },
        IndexDef {
            name: "ix_enrollments_exam_id",
            columns: &["exam_id"],
            unique: false,
        },
    ],
};
