//! Rust models matching the database schema.

use chrono::NaiveDate;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A record of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub signup_date: Option<NaiveDate>,
    /// `None` both for an unset number and for stores where the column was
    /// never added.
    pub phone_number: Option<String>,
}

impl User {
    /// Build a user from a `SELECT *` row, tolerating a missing
    /// `phone_number` column.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let phone_number = match row.as_ref().column_index("phone_number") {
            Ok(index) => row.get(index)?,
            Err(_) => None,
        };

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            signup_date: row.get("signup_date")?,
            phone_number,
        })
    }
}
