// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurtorialError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Lesson content error in {path}: {message}")]
    ContentError { path: String, message: String },

    #[error("Failed to spawn terminal for session {session}: {message}")]
    SpawnFailed { session: String, message: String },

    #[error("Terminal I/O error for session {session}: {message}")]
    TerminalIo { session: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TurtorialError>;
