//! Adds the profile columns (`first_name`, `last_name`, `student_id`,
//! `instructor_id`) to the `users` table if they are missing.

use examdesk_admin::{console, open_session};
use examdesk_db::{migrate_users_table, USER_PROFILE_COLUMNS};

fn main() {
    let session = match open_session() {
        Ok(session) => session,
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            return;
        }
    };

    println!("{}", console::banner("MIGRATING USERS TABLE"));
    println!("\nAdding new columns to users table...");

    match migrate_users_table(&session.conn) {
        Ok(changes) => {
            for change in &changes {
                println!("  {}", console::column_change_line(change));
            }
            println!("\n[SUCCESS] Migration complete!");
            println!("\nNote: Existing users will have empty strings for first_name/last_name");
            println!(
                "      and NULL for student_id/instructor_id if they were created before this migration."
            );
            println!("\n{}", console::rule());
        }
        Err(e) => {
            println!("\n[ERROR] Error during migration: {}", console::error_chain(&e));
            println!("\nYou may need to manually add the columns using SQL:");
            for spec in USER_PROFILE_COLUMNS {
                println!("  ALTER TABLE users ADD COLUMN {} {};", spec.name, spec.definition);
            }
        }
    }
}
