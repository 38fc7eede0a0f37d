//! Scripts: ordered steps for the session runner.
//!
//! Each named step in [`CATALOG`] is one statement block of the users
//! walkthrough. A script is assembled from step names, from a SQL file, or
//! from the full walkthrough, and the runner executes it top to bottom.

use std::fmt;
use userstore_common::{Error, Result};
use userstore_db::schema;
use userstore_db::statement::{split_statements, StatementKind};

/// One unit of work in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A single SQL statement.
    Sql { label: String, sql: String },
    /// Make pending mutations durable.
    Commit,
    /// Discard pending mutations.
    Rollback,
}

impl Step {
    fn sql(label: &str, sql: &str) -> Self {
        Self::Sql {
            label: label.to_string(),
            sql: sql.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Sql { label, .. } => label,
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

/// A named entry of the step catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// `None` for transaction control entries.
    pub sql: Option<&'static str>,
}

impl CatalogEntry {
    pub fn to_step(&self) -> Step {
        match (self.name, self.sql) {
            (_, Some(sql)) => Step::sql(self.name, sql),
            ("rollback", None) => Step::Rollback,
            (_, None) => Step::Commit,
        }
    }
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "create-table",
        description: "Create the users table",
        sql: Some(schema::CREATE_USERS),
    },
    CatalogEntry {
        name: "add-phone-column",
        description: "Add the optional phone_number column",
        sql: Some(schema::ADD_PHONE_NUMBER),
    },
    CatalogEntry {
        name: "drop-table",
        description: "Drop the users table and every record in it",
        sql: Some(schema::DROP_USERS),
    },
    CatalogEntry {
        name: "seed-users",
        description: "Insert Sofia Ramirez and Devon Blake",
        sql: Some(
            "INSERT INTO users (name, email)
    VALUES
        ('Sofia Ramirez', 'sofia.ramirez@example.com'),
        ('Devon Blake', 'devon.blake@example.com')",
        ),
    },
    CatalogEntry {
        name: "update-devon-email",
        description: "Move Devon Blake to devon.blake@newdomain.com",
        sql: Some(
            "UPDATE users
    SET email = 'devon.blake@newdomain.com'
    WHERE email = 'devon.blake@example.com'",
        ),
    },
    CatalogEntry {
        name: "insert-test-user",
        description: "Insert the Test User record",
        sql: Some("INSERT INTO users (name, email) VALUES ('Test User', 'test@test.com')"),
    },
    CatalogEntry {
        name: "select-test-user",
        description: "Show records named Test User",
        sql: Some("SELECT * FROM users WHERE name = 'Test User'"),
    },
    CatalogEntry {
        name: "delete-test-user",
        description: "Delete records named Test User",
        sql: Some("DELETE FROM users WHERE name = 'Test User'"),
    },
    CatalogEntry {
        name: "select-all",
        description: "Show every record",
        sql: Some("SELECT * FROM users"),
    },
    CatalogEntry {
        name: "commit",
        description: "Commit pending changes",
        sql: None,
    },
    CatalogEntry {
        name: "rollback",
        description: "Discard pending changes",
        sql: None,
    },
];

/// Look up a catalog entry by name.
pub fn find_step(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}

/// Step names of the full walkthrough, in order.
const WALKTHROUGH: &[&str] = &[
    "create-table",
    "add-phone-column",
    "seed-users",
    "commit",
    "update-devon-email",
    "commit",
    "insert-test-user",
    "commit",
    "select-test-user",
    "delete-test-user",
    "commit",
    "select-all",
];

/// An ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Default for Script {
    /// Print every record and nothing else.
    fn default() -> Self {
        Self::from_names(["select-all"]).unwrap_or_else(|_| Self { steps: Vec::new() })
    }
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Build a script from catalog step names.
    ///
    /// # Example
    ///
    /// ```
    /// use userstore::script::Script;
    ///
    /// let script = Script::from_names(["seed-users", "commit", "select-all"]).unwrap();
    /// assert_eq!(script.len(), 3);
    /// assert!(Script::from_names(["seed-everything"]).is_err());
    /// ```
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let steps = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                find_step(name).map(CatalogEntry::to_step).ok_or_else(|| {
                    let known: Vec<_> = CATALOG.iter().map(|e| e.name).collect();
                    Error::invalid_input(format!(
                        "unknown step '{}' (known steps: {})",
                        name,
                        known.join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    /// Build a script from SQL text.
    ///
    /// `COMMIT`/`END` and `ROLLBACK` statements become control steps.
    /// `BEGIN` and savepoints are rejected; the session opens transactions
    /// itself.
    pub fn from_sql(text: &str) -> Result<Self> {
        let steps = split_statements(text)
            .into_iter()
            .enumerate()
            .map(|(i, sql)| match StatementKind::classify(&sql) {
                StatementKind::Commit => Ok(Step::Commit),
                StatementKind::Rollback => Ok(Step::Rollback),
                StatementKind::Unsupported => Err(Error::invalid_input(format!(
                    "statement {} manages transactions itself: {}",
                    i + 1,
                    sql
                ))),
                _ => Ok(Step::Sql {
                    label: format!("statement {}", i + 1),
                    sql,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    /// The whole walkthrough: create, evolve, seed, update, insert, inspect,
    /// delete and list, committing after each mutation. Dropping the table is
    /// left out.
    pub fn full_walkthrough() -> Self {
        Self::from_names(WALKTHROUGH).unwrap_or_else(|_| Self { steps: Vec::new() })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<_> = self.steps.iter().map(Step::label).collect();
        write!(f, "{}", labels.join(" -> "))
    }
}
