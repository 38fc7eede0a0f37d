//! Common error types used throughout userstore.
//!
//! This module provides a unified error type covering the failure classes a
//! session can hit: constraint violations, missing tables, malformed
//! statements, store access problems, and unfinished transactions.

/// Common error type for userstore.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A UNIQUE or NOT NULL constraint rejected the statement.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The statement referenced a table that does not exist.
    #[error("Missing table: {0}")]
    MissingTable(String),

    /// The statement could not be parsed.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The store could not be opened or accessed.
    #[error("Store error: {0}")]
    Store(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(String),

    /// The session was closed while mutations were still uncommitted.
    #[error("Session closed with {pending} uncommitted change(s); they were rolled back")]
    UncommittedChanges { pending: usize },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Constraint error.
    pub fn constraint<S: Into<String>>(msg: S) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create a new MissingTable error.
    pub fn missing_table<S: Into<String>>(msg: S) -> Self {
        Self::MissingTable(msg.into())
    }

    /// Create a new Syntax error.
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Self::Syntax(msg.into())
    }

    /// Create a new Store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
