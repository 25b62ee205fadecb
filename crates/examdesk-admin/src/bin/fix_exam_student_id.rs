//! Rebuilds the `exams` table so that `student_id` accepts NULL.
//!
//! Needs exclusive access to `exams` while it runs. With the default
//! stepwise mode a failure part way leaves the table partially migrated;
//! set `migrations.atomic_rebuild = true` to run the rebuild in one
//! transaction.

use examdesk_admin::{console, open_session};
use examdesk_db::{
    fix_exam_student_id, MigrationError, RebuildMode, RebuildOutcome, RebuildReport,
};

fn main() {
    let session = match open_session() {
        Ok(session) => session,
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            return;
        }
    };
    let mode = session.config.migrations.rebuild_mode();

    println!("{}", console::banner("FIXING STUDENT_ID CONSTRAINT IN EXAMS TABLE"));

    match fix_exam_student_id(&session.conn, mode) {
        Ok(RebuildOutcome::AlreadyNullable) => {
            println!("[+] student_id is already nullable. No changes needed.");
        }
        Ok(RebuildOutcome::Rebuilt(report)) => print_report(&report),
        Err(MigrationError::ColumnNotFound { .. }) => {
            println!("[ERROR] student_id column not found!");
        }
        Err(MigrationError::TableNotFound(table)) => {
            println!("[ERROR] {table} table not found!");
        }
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            if mode == RebuildMode::Stepwise && matches!(e, MigrationError::RebuildStep { .. }) {
                println!("\nSteps before the failure were committed; the exams table may be");
                println!("partially migrated. Fix the cause and run this script again.");
            }
        }
    }
}

fn print_report(report: &RebuildReport) {
    println!("[!] student_id was NOT NULL. The table has been recreated.");
    println!("\n[INFO] Existing columns: {}", report.original_columns.join(", "));

    match &report.scratch_cleanup_error {
        None => println!("\n[+] Cleaned up any leftover tables from previous migration"),
        Some(error) => println!("\n    [!] Note: {error}"),
    }

    println!(
        "\n[OK] Data copied ({} rows, {} columns)",
        report.copied_rows,
        report.copied_columns.len()
    );
    if !report.defaulted_columns.is_empty() {
        println!("    New columns left at their defaults: {}", report.defaulted_columns.join(", "));
    }
    if !report.carried_columns.is_empty() {
        println!("    Extra columns carried over: {}", report.carried_columns.join(", "));
    }

    println!("\n[+] Recreating indexes...");
    for outcome in &report.indexes {
        println!("    {}", console::index_outcome_line(outcome));
    }

    if report.foreign_key_violations > 0 {
        println!(
            "\n[WARNING] {} exam rows reference users that do not exist.",
            report.foreign_key_violations
        );
    }

    println!("\n[SUCCESS] Migration complete!");
    println!("student_id is now nullable in the exams table.");
    println!("{}", console::rule());
}
