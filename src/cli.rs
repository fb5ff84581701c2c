// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `turtorial`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "turtorial",
    version,
    about = "Serve interactive shell tutorials with live terminals and step verification.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Turtorial.toml` in the current directory is used when it
    /// exists; otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. `0.0.0.0:8080`. Overrides `[server].bind`.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory containing lessons. Overrides `[lessons].directory`.
    #[arg(long, value_name = "DIR")]
    pub lessons_dir: Option<PathBuf>,

    /// Include draft lessons and steps.
    #[arg(long)]
    pub dev_mode: bool,

    /// Never run before/after step scripts (verification still runs).
    #[arg(long)]
    pub disable_environment_scripts: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TURTORIAL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config and lessons, print them, but don't start the server.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
