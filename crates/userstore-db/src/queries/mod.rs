//! Database query modules.
//!
//! - users: typed CRUD over the `users` table

pub mod users;
