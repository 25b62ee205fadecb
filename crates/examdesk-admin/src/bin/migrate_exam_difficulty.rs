//! Adds the nullable `exam_difficulty` column to the `exams` table.

use examdesk_admin::{console, open_session};
use examdesk_db::migrate_exam_difficulty;

fn main() {
    let session = match open_session() {
        Ok(session) => session,
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            return;
        }
    };

    println!("{}", console::banner("MIGRATING EXAMS TABLE - ADDING EXAM DIFFICULTY FIELD"));
    println!("\nAdding exam_difficulty column to exams table...");

    match migrate_exam_difficulty(&session.conn) {
        Ok(changes) => {
            for change in &changes {
                println!("  {}", console::column_change_line(change));
            }
            println!("\n[SUCCESS] Migration complete!");
            println!("\nThe exams table has been extended with:");
            println!(
                "  - exam_difficulty (String, nullable) - e.g., 'Undergraduate - Senior', 'Graduate', 'PhD'"
            );
            println!("\n{}", console::rule());
        }
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            println!("\nYou may need to manually add the column or recreate the table.");
        }
    }
}
