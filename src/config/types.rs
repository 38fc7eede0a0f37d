use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use userstore_common::UncommittedPolicy;

use crate::runner::OutputFormat;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub script: ScriptConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SQLite file; created on first use (default: my_db.sqlite)
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("my_db.sqlite")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// What to do with uncommitted changes at close (default: error)
    #[serde(default)]
    pub on_uncommitted: UncommittedPolicy,

    /// Commit after every mutating statement
    #[serde(default)]
    pub commit_after_mutations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptConfig {
    /// Catalog step names run by default
    #[serde(default = "default_steps")]
    pub steps: Vec<String>,

    #[serde(default)]
    pub format: OutputFormat,
}

fn default_steps() -> Vec<String> {
    vec!["select-all".to_string()]
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            format: OutputFormat::default(),
        }
    }
}
