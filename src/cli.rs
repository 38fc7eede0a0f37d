use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use userstore::runner::OutputFormat;
use userstore_common::UncommittedPolicy;

#[derive(Parser)]
#[command(name = "userstore")]
#[command(
    author,
    version,
    about = "Run SQL steps against a file-backed users store",
    long_about = "Run SQL steps against a file-backed users store.\n\n\
                  Without a subcommand, runs the steps configured under [script] \
                  (by default: print every user)."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file to open (overrides [store] path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Session behaviour shared by every command that executes SQL.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Commit after every mutating statement
    #[arg(long)]
    pub autocommit: bool,

    /// What to do with uncommitted changes at close: error, rollback or commit
    #[arg(long, value_name = "POLICY")]
    pub on_uncommitted: Option<UncommittedPolicy>,

    /// How query results are printed
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run catalog steps, a SQL file, or the full walkthrough
    Run {
        /// Catalog step to run (repeatable, in order)
        #[arg(short, long = "step", value_name = "NAME")]
        steps: Vec<String>,

        /// SQL file to run statement by statement
        #[arg(short, long, conflicts_with_all = ["steps", "walkthrough"])]
        file: Option<PathBuf>,

        /// Run every catalog block in order, committing after each change
        #[arg(long, conflicts_with = "steps")]
        walkthrough: bool,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Execute SQL given on the command line
    Exec {
        /// One or more statements separated by semicolons
        #[arg(required = true)]
        sql: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// List users with typed columns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the step catalog
    Steps,

    /// Display version information
    Version,
}
