//! The owned connection handle and its transaction state.
//!
//! A `Session` wraps exactly one SQLite connection for the lifetime of a run.
//! Mutations open a transaction on demand and stay pending until `commit`.
//! Closing applies the session's `UncommittedPolicy`; dropping a session
//! without closing it (the failure path) rolls back whatever is pending
//! before the connection is released.

use rusqlite::types::Value;
use rusqlite::{Connection, Params, Row};
use std::path::{Path, PathBuf};
use userstore_common::{Error, Result, UncommittedPolicy};

use crate::error::classify_error;
use crate::result::ResultSet;
use crate::statement::StatementKind;

/// Transaction state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// No mutation since open or since the last rollback.
    Idle,
    /// At least one mutation is waiting for a commit.
    Pending,
    /// Every mutation so far has been committed.
    Committed,
}

/// What executing one statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A query and its rows.
    Rows(ResultSet),
    /// A mutation and the number of rows it changed.
    Changed(usize),
    /// A schema change.
    Schema,
    /// An explicit commit.
    Committed,
    /// An explicit rollback and the number of mutations it discarded.
    RolledBack(usize),
    /// Any other statement.
    Executed,
}

/// Summary of what happened to pending work when a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseReport {
    /// Pending mutations committed at close (`commit` policy).
    pub committed: usize,
    /// Pending mutations rolled back at close.
    pub discarded: usize,
}

impl CloseReport {
    pub fn is_clean(&self) -> bool {
        self.committed == 0 && self.discarded == 0
    }
}

/// A single connection to the store plus its explicit transaction state.
#[derive(Debug)]
pub struct Session {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    policy: UncommittedPolicy,
    state: TxState,
    pending: usize,
}

impl Session {
    /// Open (creating if needed) the store at `path`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use userstore_common::UncommittedPolicy;
    /// use userstore_db::session::Session;
    ///
    /// let mut session = Session::open("my_db.sqlite", UncommittedPolicy::Error).unwrap();
    /// session.execute("SELECT * FROM users").unwrap();
    /// session.close().unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, policy: UncommittedPolicy) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::store(format!("Failed to open store {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), policy = %policy, "Opened store");
        Ok(Self::from_connection(conn, Some(path.to_path_buf()), policy))
    }

    /// Open a private in-memory store. Its contents vanish on close.
    ///
    /// ```
    /// use userstore_common::UncommittedPolicy;
    /// use userstore_db::session::{Session, TxState};
    ///
    /// let session = Session::open_in_memory(UncommittedPolicy::Rollback).unwrap();
    /// assert_eq!(session.state(), TxState::Idle);
    /// ```
    pub fn open_in_memory(policy: UncommittedPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store(format!("Failed to open in-memory store: {}", e)))?;
        Ok(Self::from_connection(conn, None, policy))
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>, policy: UncommittedPolicy) -> Self {
        Self {
            conn: Some(conn),
            path,
            policy,
            state: TxState::Idle,
            pending: 0,
        }
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::internal("session connection already released"))
    }

    /// Path of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    /// Number of mutations executed since the last commit or rollback.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Row id assigned by the most recent successful insert.
    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.conn()?.last_insert_rowid())
    }

    /// Execute one statement, dispatching on its kind.
    pub fn execute(&mut self, sql: &str) -> Result<Outcome> {
        let kind = StatementKind::classify(sql);
        tracing::debug!(kind = ?kind, sql = sql.trim(), "Executing statement");

        match kind {
            StatementKind::Query => self.query(sql, []).map(Outcome::Rows),
            StatementKind::Mutation => self.mutate(sql, []).map(Outcome::Changed),
            StatementKind::Schema => self.define(sql).map(|_| Outcome::Schema),
            StatementKind::Commit => self.commit().map(|_| Outcome::Committed),
            StatementKind::Rollback => self.rollback().map(Outcome::RolledBack),
            StatementKind::Unsupported => Err(Error::invalid_input(format!(
                "transaction control is handled by the session: {}",
                sql.trim()
            ))),
            StatementKind::Other => {
                self.conn()?.execute_batch(sql).map_err(classify_error)?;
                Ok(Outcome::Executed)
            }
        }
    }

    /// Run a query and collect every row.
    pub fn query<P: Params>(&self, sql: &str, params: P) -> Result<ResultSet> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(classify_error)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut result = ResultSet::new(columns);
        let mut rows = stmt.query(params).map_err(classify_error)?;
        while let Some(row) = rows.next().map_err(classify_error)? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(classify_error)?;
            result.rows.push(values);
        }

        Ok(result)
    }

    /// Run a query and map each row with `f`.
    pub fn query_map<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(classify_error)?;
        let items = stmt
            .query_map(params, f)
            .map_err(classify_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(classify_error)?;

        Ok(items)
    }

    /// Run a mutation inside the session's transaction, opening one if needed.
    ///
    /// The change stays pending until [`Session::commit`]. If the statement
    /// fails and this call opened the transaction, the transaction is closed
    /// again so later statements do not run inside it.
    pub fn mutate<P: Params>(&mut self, sql: &str, params: P) -> Result<usize> {
        let conn = self.conn()?;
        let opened = conn.is_autocommit();
        if opened {
            conn.execute_batch("BEGIN").map_err(classify_error)?;
        }
        let changed = match conn.execute(sql, params) {
            Ok(changed) => changed,
            Err(e) => {
                if opened && !conn.is_autocommit() {
                    if let Err(rb) = conn.execute_batch("ROLLBACK") {
                        tracing::error!("Failed to close transaction after failed mutation: {}", rb);
                    }
                }
                return Err(classify_error(e));
            }
        };

        self.pending += 1;
        self.state = TxState::Pending;
        Ok(changed)
    }

    /// Run a schema statement.
    ///
    /// With no transaction open this takes effect immediately; otherwise it
    /// joins the open transaction.
    pub fn define(&mut self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql).map_err(classify_error)
    }

    /// Make every pending mutation durable.
    ///
    /// Committing with nothing pending is a no-op.
    pub fn commit(&mut self) -> Result<()> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT").map_err(classify_error)?;
        }

        if self.pending > 0 {
            tracing::info!(changes = self.pending, "Committed");
            self.state = TxState::Committed;
            self.pending = 0;
        }
        Ok(())
    }

    /// Discard every pending mutation, returning how many were discarded.
    pub fn rollback(&mut self) -> Result<usize> {
        let conn = self.conn()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK").map_err(classify_error)?;
        }

        let discarded = std::mem::take(&mut self.pending);
        if self.state == TxState::Pending {
            tracing::info!(changes = discarded, "Rolled back");
            self.state = TxState::Idle;
        }
        Ok(discarded)
    }

    /// Apply the uncommitted policy and release the connection.
    ///
    /// Under [`UncommittedPolicy::Error`] pending mutations are rolled back,
    /// the connection is still released, and the close fails with
    /// [`Error::UncommittedChanges`].
    pub fn close(mut self) -> Result<CloseReport> {
        let mut report = CloseReport::default();
        let open_tx = !self.conn()?.is_autocommit();

        if open_tx || self.pending > 0 {
            match self.policy {
                UncommittedPolicy::Commit => {
                    report.committed = self.pending;
                    self.commit()?;
                }
                UncommittedPolicy::Rollback | UncommittedPolicy::Error => {
                    report.discarded = self.rollback()?;
                    if report.discarded > 0 {
                        tracing::warn!(
                            changes = report.discarded,
                            "Closing with uncommitted changes; rolled back"
                        );
                    }
                }
            }
        }

        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| classify_error(e))?;
        }
        tracing::debug!("Closed store");

        if self.policy == UncommittedPolicy::Error && report.discarded > 0 {
            return Err(Error::UncommittedChanges {
                pending: report.discarded,
            });
        }
        Ok(report)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if conn.is_autocommit() {
            return;
        }
        match conn.execute_batch("ROLLBACK") {
            Ok(()) => tracing::warn!(
                changes = self.pending,
                "Session released without close; rolled back open transaction"
            ),
            Err(e) => tracing::error!("Failed to roll back on release: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn memory_session() -> Session {
        let mut session = Session::open_in_memory(UncommittedPolicy::Rollback).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session
    }

    fn count(session: &Session) -> i64 {
        session
            .query_map("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap()[0]
    }

    #[test]
    fn test_state_machine() {
        let mut session = memory_session();
        assert_eq!(session.state(), TxState::Idle);

        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        assert_eq!(session.state(), TxState::Pending);
        assert_eq!(session.pending(), 1);

        session.commit().unwrap();
        assert_eq!(session.state(), TxState::Committed);
        assert_eq!(session.pending(), 0);

        session
            .execute("DELETE FROM users WHERE email = 'a@example.com'")
            .unwrap();
        assert_eq!(session.state(), TxState::Pending);
        assert_eq!(session.rollback().unwrap(), 1);
        assert_eq!(session.state(), TxState::Idle);
        assert_eq!(count(&session), 1);
    }

    #[test]
    fn test_commit_with_nothing_pending_is_noop() {
        let mut session = memory_session();
        session.commit().unwrap();
        assert_eq!(session.state(), TxState::Idle);
        assert!(session.close().unwrap().is_clean());
    }

    #[test]
    fn test_execute_dispatch() {
        let mut session = memory_session();

        let outcome = session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com'), ('B', 'b@example.com')")
            .unwrap();
        assert_eq!(outcome, Outcome::Changed(2));

        assert_eq!(session.execute("COMMIT").unwrap(), Outcome::Committed);

        let outcome = session.execute("SELECT name FROM users ORDER BY id").unwrap();
        assert_matches!(outcome, Outcome::Rows(rows) if rows.len() == 2);

        let outcome = session
            .execute("ALTER TABLE users ADD COLUMN phone_number TEXT")
            .unwrap();
        assert_eq!(outcome, Outcome::Schema);

        assert_matches!(session.execute("BEGIN"), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_failed_mutation_keeps_previous_pending_work() {
        let mut session = memory_session();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();

        let err = session
            .execute("INSERT INTO users (name, email) VALUES ('B', 'a@example.com')")
            .unwrap_err();
        assert_matches!(err, Error::Constraint(_));

        assert_eq!(session.pending(), 1);
        assert_eq!(count(&session), 1);
    }

    #[test]
    fn test_failed_first_mutation_leaves_no_open_transaction() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        schema::create_users_table(&mut session).unwrap();

        let err = session
            .execute("INSERT INTO users (name, email) VALUES ('A', NULL)")
            .unwrap_err();
        assert_matches!(err, Error::Constraint(_));
        assert_eq!(session.state(), TxState::Idle);
        assert_eq!(session.pending(), 0);

        // Schema changes after the failure take effect immediately.
        session.define("CREATE TABLE audit (id INTEGER)").unwrap();
        assert!(session.close().unwrap().is_clean());

        let session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        let tables: i64 = session
            .query_map(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'audit'",
                [],
                |row| row.get(0),
            )
            .unwrap()[0];
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_schema_change_joins_pending_transaction() {
        let mut session = memory_session();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        schema::add_phone_number_column(&mut session).unwrap();
        assert!(schema::users_columns(&session)
            .unwrap()
            .contains(&"phone_number".to_string()));

        assert_eq!(session.rollback().unwrap(), 1);
        assert!(!schema::users_columns(&session)
            .unwrap()
            .contains(&"phone_number".to_string()));
        assert_eq!(count(&session), 0);
    }

    #[test]
    fn test_close_policy_error_reports_uncommitted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Rollback).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session.close().unwrap();

        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        assert_matches!(
            session.close(),
            Err(Error::UncommittedChanges { pending: 1 })
        );

        let session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        assert_eq!(count(&session), 0);
    }

    #[test]
    fn test_close_policy_rollback_reports_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Rollback).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        session
            .execute("INSERT INTO users (name, email) VALUES ('B', 'b@example.com')")
            .unwrap();
        let report = session.close().unwrap();
        assert_eq!(report.discarded, 2);
        assert_eq!(report.committed, 0);

        let session = Session::open(&path, UncommittedPolicy::Rollback).unwrap();
        assert_eq!(count(&session), 0);
    }

    #[test]
    fn test_close_policy_commit_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Commit).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        let report = session.close().unwrap();
        assert_eq!(report.committed, 1);

        let session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        assert_eq!(count(&session), 1);
    }

    #[test]
    fn test_drop_rolls_back_and_releases_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite");

        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        schema::create_users_table(&mut session).unwrap();
        session
            .execute("INSERT INTO users (name, email) VALUES ('A', 'a@example.com')")
            .unwrap();
        drop(session);

        // A second writer can take the lock straight away.
        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        assert_eq!(count(&session), 0);
        session
            .execute("INSERT INTO users (name, email) VALUES ('B', 'b@example.com')")
            .unwrap();
        session.commit().unwrap();
        session.close().unwrap();
    }

    #[test]
    fn test_open_unwritable_path_is_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("store.sqlite");
        assert_matches!(
            Session::open(&path, UncommittedPolicy::Error),
            Err(Error::Store(_))
        );
    }

    #[test]
    fn test_open_creates_store_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.sqlite");
        assert!(!path.exists());

        let mut session = Session::open(&path, UncommittedPolicy::Error).unwrap();
        schema::create_users_table(&mut session).unwrap();
        assert_eq!(session.path(), Some(path.as_path()));
        session.close().unwrap();

        assert!(path.exists());
    }
}
