//! Database layer for examdesk.
//!
//! Provides the SQLite session factory (via `r2d2`), live schema
//! introspection, the model table definitions, queries on `users`, and the
//! one-shot schema maintenance operations run by the admin scripts.
//!
//! Every operation takes the connection as an argument. Callers decide how
//! long a session lives; the maintenance scripts hold one pooled connection
//! for their whole run.

pub mod catalog;
mod migrations;
mod pool;
pub mod schema;
pub mod users;

pub use migrations::{
    add_missing_columns, create_enrollments_table, create_table, fix_exam_student_id,
    migrate_exam_difficulty, migrate_users_table, relax_not_null, scratch_table_name,
    ColumnChange, ColumnSpec, IndexOutcome, MigrationError, RebuildMode, RebuildOutcome,
    RebuildReport, RebuildStep, TableCreation, EXAM_DIFFICULTY_COLUMNS, USER_PROFILE_COLUMNS,
};
pub use pool::{create_pool, DbConnection, DbPool, DbRuntimeSettings, PoolError};
