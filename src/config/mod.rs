mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::script;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to load config file: {:?}", path))?;

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Invalid TOML")?;

    config.store.path = expand_path(&config.store.path);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./userstore.toml", "~/.config/userstore/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Expand a leading `~` in a store path
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.store.path.as_os_str().is_empty() {
        anyhow::bail!("Store path cannot be empty");
    }

    for name in &config.script.steps {
        if script::find_step(name).is_none() {
            anyhow::bail!("Unknown step '{}' in [script] steps", name);
        }
    }

    Ok(())
}
