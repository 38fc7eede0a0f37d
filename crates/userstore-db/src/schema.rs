//! The `users` table definition and its schema changes.

use userstore_common::Result;

use crate::session::Session;

/// Name of the only table the store holds.
pub const USERS_TABLE: &str = "users";

/// Initial table definition.
pub const CREATE_USERS: &str = "CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    signup_date DATE DEFAULT CURRENT_DATE
)";

/// Schema evolution adding the optional phone number.
pub const ADD_PHONE_NUMBER: &str = "ALTER TABLE users ADD COLUMN phone_number TEXT";

/// Remove the table and every record in it.
pub const DROP_USERS: &str = "DROP TABLE users";

pub fn create_users_table(session: &mut Session) -> Result<()> {
    session.define(CREATE_USERS)
}

pub fn add_phone_number_column(session: &mut Session) -> Result<()> {
    session.define(ADD_PHONE_NUMBER)
}

pub fn drop_users_table(session: &mut Session) -> Result<()> {
    session.define(DROP_USERS)
}

/// Whether the `users` table currently exists.
pub fn users_table_exists(session: &Session) -> Result<bool> {
    let count: Vec<i64> = session.query_map(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [USERS_TABLE],
        |row| row.get(0),
    )?;
    Ok(count.first().copied().unwrap_or(0) > 0)
}

/// Column names of `users` in table order; empty when the table is missing.
pub fn users_columns(session: &Session) -> Result<Vec<String>> {
    session.query_map("SELECT name FROM pragma_table_info('users')", [], |row| {
        row.get(0)
    })
}
