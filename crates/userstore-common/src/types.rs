//! Policy types shared by the session layer and the runner configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// What a session does with pending mutations when it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UncommittedPolicy {
    /// Roll back, then fail the close with `Error::UncommittedChanges`.
    #[default]
    Error,
    /// Roll back and report the discarded count.
    Rollback,
    /// Commit before closing.
    Commit,
}

impl UncommittedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Rollback => "rollback",
            Self::Commit => "commit",
        }
    }
}

impl fmt::Display for UncommittedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncommittedPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "rollback" => Ok(Self::Rollback),
            "commit" => Ok(Self::Commit),
            other => Err(Error::invalid_input(format!(
                "unknown uncommitted policy '{}' (expected error, rollback or commit)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default_is_error() {
        assert_eq!(UncommittedPolicy::default(), UncommittedPolicy::Error);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "Rollback".parse::<UncommittedPolicy>().unwrap(),
            UncommittedPolicy::Rollback
        );
        assert_eq!(
            "commit".parse::<UncommittedPolicy>().unwrap(),
            UncommittedPolicy::Commit
        );
        assert!("discard".parse::<UncommittedPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_lowercase() {
        let json = serde_json::to_string(&UncommittedPolicy::Rollback).unwrap();
        assert_eq!(json, "\"rollback\"");
        let back: UncommittedPolicy = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(back, UncommittedPolicy::Error);
    }
}
