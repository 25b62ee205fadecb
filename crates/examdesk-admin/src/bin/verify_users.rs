//! Prints every user and flags profiles missing required fields.
//! Read-only.

use examdesk_admin::report::{find_field_issues, render_user_table};
use examdesk_admin::{console, open_session};
use examdesk_db::users::list_users;

fn main() {
    let session = match open_session() {
        Ok(session) => session,
        Err(e) => {
            println!("Error querying database: {}", console::error_chain(&e));
            return;
        }
    };

    let users = match list_users(&session.conn) {
        Ok(users) => users,
        Err(e) => {
            println!("Error querying database: {e}");
            println!(
                "\nNote: If you see a column error, you may need to update your database schema."
            );
            println!(
                "The User model was updated with new columns (first_name, last_name, student_id, instructor_id)."
            );
            return;
        }
    };

    if users.is_empty() {
        println!("No users found in the database.");
        println!("\nTo test: Create a new account through the signup page at /signup");
        return;
    }

    println!("{}", console::banner("USERS IN DATABASE"));
    println!("\nTotal users: {}\n", users.len());
    println!("{}", render_user_table(&users));

    println!("\n{}", console::banner("FIELD VERIFICATION"));

    let issues = find_field_issues(&users);
    if issues.is_empty() {
        println!("\n[OK] All users have the required fields populated correctly!");
    } else {
        println!("\n[WARNING] Issues found:");
        for issue in &issues {
            println!("  - {issue}");
        }
    }

    println!("\n{}", console::rule());
}
