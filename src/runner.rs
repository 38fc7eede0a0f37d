//! The session runner.
//!
//! Executes a script against one session in program order, printing query
//! results as it goes, then closes the session. Any failing step aborts the
//! run; the session is dropped on that path, which rolls back pending work
//! and releases the connection.

use serde::{Deserialize, Serialize};
use std::io::Write;
use userstore_common::{Error, Result};
use userstore_db::{CloseReport, Outcome, ResultSet, Session};

use crate::script::{Script, Step};

/// How result sets are written to the output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[(1, 'Sofia Ramirez', ...), ...]`
    #[default]
    Tuples,
    /// One JSON array of row objects per result set.
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Commit right after every successful mutation.
    pub commit_after_mutations: bool,
    pub format: OutputFormat,
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    /// SQL statements executed (control steps excluded).
    pub statements: usize,
    pub commits: usize,
    pub rollbacks: usize,
    /// Result sets written to the output.
    pub result_sets: usize,
    /// Rows changed by mutations.
    pub rows_changed: usize,
    pub close: CloseReport,
}

/// Run `script` on `session`, writing every query result to `out`.
pub fn run_script<W: Write>(
    mut session: Session,
    script: &Script,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    for (index, step) in script.steps().iter().enumerate() {
        tracing::debug!(step = index + 1, label = step.label(), "Running step");

        match step {
            Step::Commit => {
                session.commit()?;
                report.commits += 1;
            }
            Step::Rollback => {
                session.rollback()?;
                report.rollbacks += 1;
            }
            Step::Sql { label, sql } => {
                let outcome = session.execute(sql).map_err(|e| {
                    tracing::error!(step = index + 1, label = %label, "Step failed: {}", e);
                    e
                })?;
                report.statements += 1;

                match outcome {
                    Outcome::Rows(rows) => {
                        write_result_set(out, &rows, options.format)?;
                        report.result_sets += 1;
                    }
                    Outcome::Changed(count) => {
                        report.rows_changed += count;
                        if options.commit_after_mutations {
                            session.commit()?;
                            report.commits += 1;
                        }
                    }
                    Outcome::Committed => report.commits += 1,
                    Outcome::RolledBack(_) => report.rollbacks += 1,
                    Outcome::Schema | Outcome::Executed => {}
                }
            }
        }
    }

    report.close = session.close()?;

    tracing::info!(
        statements = report.statements,
        commits = report.commits,
        result_sets = report.result_sets,
        rows_changed = report.rows_changed,
        "Run complete"
    );
    Ok(report)
}

fn write_result_set<W: Write>(out: &mut W, rows: &ResultSet, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Tuples => writeln!(out, "{}", rows)?,
        OutputFormat::Json => {
            let json = serde_json::to_string(&rows.to_json())
                .map_err(|e| Error::internal(format!("Failed to encode rows: {}", e)))?;
            writeln!(out, "{}", json)?;
        }
    }
    Ok(())
}
