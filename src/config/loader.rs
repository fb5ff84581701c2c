// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TurtorialError};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to get
/// the typed, checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        TurtorialError::ConfigError(format!("reading config file at {path:?}: {e}"))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the effective config.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used if present, otherwise the
///   built-in defaults.
pub fn resolve(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => load_and_validate(path),
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                load_and_validate(default_path)
            } else {
                debug!(path = ?default_path, "no config file found; using defaults");
                ConfigFile::try_from(RawConfigFile::default())
            }
        }
    }
}

/// `Turtorial.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Turtorial.toml")
}
