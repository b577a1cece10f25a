// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Name of the config file looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "Fastpipe.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a project.
///
/// - An explicit `--config` path must exist.
/// - Otherwise `<root>/Fastpipe.toml` is used if present, and the built-in
///   defaults if not.
pub fn load_for_project(root: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path(root);
    if path.is_file() {
        debug!(path = ?path, "loading project config");
        load_and_validate(&path)
    } else {
        debug!(path = ?path, "no project config found; using defaults");
        Ok(ConfigFile::default())
    }
}

/// `<root>/Fastpipe.toml`.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
