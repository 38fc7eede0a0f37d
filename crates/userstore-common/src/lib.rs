//! Userstore-Common: Shared error type and policy enums.
//!
//! - **Error Handling**: the error taxonomy every userstore crate returns
//! - **Policies**: how a session treats uncommitted changes on close
//!
//! # Examples
//!
//! ```
//! use userstore_common::{Error, Result, UncommittedPolicy};
//!
//! fn example() -> Result<()> {
//!     Err(Error::missing_table("no such table: users"))
//! }
//!
//! assert!(example().is_err());
//! assert_eq!(UncommittedPolicy::default().as_str(), "error");
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
