//! Userstore-DB: session, statements, schema, and user queries
//!
//! This crate wraps a single rusqlite connection for a file-backed users
//! store.
//!
//! # Modules
//!
//! - `session` - Owned connection with explicit transaction state
//! - `statement` - Statement classification and script splitting
//! - `result` - Query result sets and their printed form
//! - `schema` - The `users` table definition and schema changes
//! - `models` - Rust models matching the database schema
//! - `queries` - Typed user operations
//!
//! # Example
//!
//! ```no_run
//! use userstore_common::UncommittedPolicy;
//! use userstore_db::queries::users;
//! use userstore_db::session::Session;
//!
//! let mut session = Session::open("my_db.sqlite", UncommittedPolicy::Error).unwrap();
//! users::insert_user(&mut session, "Sofia Ramirez", "sofia.ramirez@example.com").unwrap();
//! session.commit().unwrap();
//! session.close().unwrap();
//! ```

pub mod error;
pub mod models;
pub mod queries;
pub mod result;
pub mod schema;
pub mod session;
pub mod statement;

pub use result::ResultSet;
pub use session::{CloseReport, Outcome, Session, TxState};
pub use statement::StatementKind;
