//! Creates the `enrollments` table if it does not exist.

use examdesk_admin::{console, open_session};
use examdesk_db::{create_enrollments_table, TableCreation};

fn main() {
    let session = match open_session() {
        Ok(session) => session,
        Err(e) => {
            println!("[X] Error creating enrollments table: {}", console::error_chain(&e));
            return;
        }
    };

    println!("Creating enrollments table...");

    match create_enrollments_table(&session.conn) {
        Ok(TableCreation::Created) => println!("[+] Successfully created enrollments table"),
        Ok(TableCreation::AlreadyExists) => {
            println!("[+] enrollments table already exists, nothing to do")
        }
        Err(e) => println!("[X] Error creating enrollments table: {}", console::error_chain(&e)),
    }
}
