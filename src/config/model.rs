// src/config/model.rs

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// bind = "127.0.0.1:8080"
///
/// [terminal]
/// shell = "/bin/bash"
/// args = ["-l"]
/// term = "xterm"
///
/// [scripts]
/// environment_scripts_enabled = true
/// timeout = "30s"
///
/// [lessons]
/// directory = "lessons"
/// ```
///
/// All sections are optional and have reasonable defaults. Durations are
/// still strings here; [`ConfigFile`] is the validated, typed form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: RawServerSection,

    #[serde(default)]
    pub terminal: RawTerminalSection,

    #[serde(default)]
    pub scripts: RawScriptsSection,

    #[serde(default)]
    pub lessons: RawLessonsSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for RawServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// `[terminal]` section: how interactive shells are spawned.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTerminalSection {
    #[serde(default = "default_terminal_shell")]
    pub shell: String,

    #[serde(default = "default_terminal_args")]
    pub args: Vec<String>,

    /// Value exported as `TERM` to the shell.
    #[serde(default = "default_term")]
    pub term: String,

    #[serde(default = "default_cols")]
    pub cols: u16,

    #[serde(default = "default_rows")]
    pub rows: u16,

    /// Working directory for new shells; inherits the server's when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// How long `close` waits for the output relay to wind down.
    #[serde(default = "default_close_grace")]
    pub close_grace: String,
}

fn default_terminal_shell() -> String {
    "/bin/bash".to_string()
}

fn default_terminal_args() -> Vec<String> {
    vec!["-l".to_string()]
}

fn default_term() -> String {
    "xterm".to_string()
}

fn default_cols() -> u16 {
    80
}

fn default_rows() -> u16 {
    24
}

fn default_close_grace() -> String {
    "2s".to_string()
}

impl Default for RawTerminalSection {
    fn default() -> Self {
        Self {
            shell: default_terminal_shell(),
            args: default_terminal_args(),
            term: default_term(),
            cols: default_cols(),
            rows: default_rows(),
            cwd: None,
            close_grace: default_close_grace(),
        }
    }
}

/// `[scripts]` section: one-shot test/before/after commands.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScriptsSection {
    /// When false, before/after commands are skipped and report success.
    /// Test commands always run.
    #[serde(default = "default_true")]
    pub environment_scripts_enabled: bool,

    #[serde(default = "default_script_shell")]
    pub shell: String,

    /// Optional upper bound on a single command, e.g. `"30s"`.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_script_shell() -> String {
    "sh".to_string()
}

impl Default for RawScriptsSection {
    fn default() -> Self {
        Self {
            environment_scripts_enabled: true,
            shell: default_script_shell(),
            timeout: None,
        }
    }
}

/// `[lessons]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLessonsSection {
    #[serde(default = "default_lessons_dir")]
    pub directory: PathBuf,

    /// Include lessons and steps marked `draft: true`.
    #[serde(default)]
    pub dev_mode: bool,

    /// Abort loading on a malformed step file instead of skipping it.
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
}

fn default_lessons_dir() -> PathBuf {
    PathBuf::from("lessons")
}

impl Default for RawLessonsSection {
    fn default() -> Self {
        Self {
            directory: default_lessons_dir(),
            dev_mode: false,
            fail_on_error: true,
        }
    }
}

/// Validated configuration used by the rest of the application.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub terminal: TerminalConfig,
    pub scripts: ScriptsConfig,
    pub lessons: LessonsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

/// Everything needed to spawn one interactive shell.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub shell: String,
    pub args: Vec<String>,
    pub term: String,
    pub cols: u16,
    pub rows: u16,
    pub cwd: Option<PathBuf>,
    pub close_grace: Duration,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            shell: default_terminal_shell(),
            args: default_terminal_args(),
            term: default_term(),
            cols: default_cols(),
            rows: default_rows(),
            cwd: None,
            close_grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptsConfig {
    pub environment_scripts_enabled: bool,
    pub shell: String,
    pub timeout: Option<Duration>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            environment_scripts_enabled: true,
            shell: default_script_shell(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LessonsConfig {
    pub directory: PathBuf,
    pub dev_mode: bool,
    pub fail_on_error: bool,
}

impl Default for LessonsConfig {
    fn default() -> Self {
        Self {
            directory: default_lessons_dir(),
            dev_mode: false,
            fail_on_error: true,
        }
    }
}
