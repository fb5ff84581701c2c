// src/config/mod.rs

//! Configuration loading and validation for turtorial.
//!
//! - `model.rs`: the TOML-backed raw model and the validated typed model.
//! - `loader.rs`: reading the file from disk.
//! - `validate.rs`: raw -> typed conversion (durations, addresses, sizes).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve};
pub use model::{
    ConfigFile, LessonsConfig, RawConfigFile, ScriptsConfig, ServerConfig, TerminalConfig,
};
pub use validate::parse_duration;
