// src/config/validate.rs

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::model::{
    ConfigFile, LessonsConfig, RawConfigFile, RawScriptsSection, RawTerminalSection,
    ScriptsConfig, ServerConfig, TerminalConfig,
};
use crate::errors::{Result, TurtorialError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TurtorialError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let bind: SocketAddr = raw.server.bind.trim().parse().map_err(|e| {
            TurtorialError::ConfigError(format!(
                "[server].bind '{}' is not a socket address: {e}",
                raw.server.bind
            ))
        })?;

        Ok(ConfigFile {
            server: ServerConfig { bind },
            terminal: validate_terminal(raw.terminal)?,
            scripts: validate_scripts(raw.scripts)?,
            lessons: LessonsConfig {
                directory: raw.lessons.directory,
                dev_mode: raw.lessons.dev_mode,
                fail_on_error: raw.lessons.fail_on_error,
            },
        })
    }
}

fn validate_terminal(raw: RawTerminalSection) -> Result<TerminalConfig> {
    if raw.shell.trim().is_empty() {
        return Err(TurtorialError::ConfigError(
            "[terminal].shell must not be empty".to_string(),
        ));
    }
    if raw.term.trim().is_empty() {
        return Err(TurtorialError::ConfigError(
            "[terminal].term must not be empty".to_string(),
        ));
    }
    if raw.cols == 0 || raw.rows == 0 {
        return Err(TurtorialError::ConfigError(format!(
            "[terminal] window size must be at least 1x1 (got {}x{})",
            raw.cols, raw.rows
        )));
    }

    let close_grace = parse_duration(&raw.close_grace).map_err(|e| {
        TurtorialError::ConfigError(format!("[terminal].close_grace: {e}"))
    })?;

    Ok(TerminalConfig {
        shell: raw.shell,
        args: raw.args,
        term: raw.term,
        cols: raw.cols,
        rows: raw.rows,
        cwd: raw.cwd,
        close_grace,
    })
}

fn validate_scripts(raw: RawScriptsSection) -> Result<ScriptsConfig> {
    if raw.shell.trim().is_empty() {
        return Err(TurtorialError::ConfigError(
            "[scripts].shell must not be empty".to_string(),
        ));
    }

    let timeout = match raw.timeout.as_deref() {
        None => None,
        Some(s) => {
            let dur = parse_duration(s)
                .map_err(|e| TurtorialError::ConfigError(format!("[scripts].timeout: {e}")))?;
            if dur.is_zero() {
                return Err(TurtorialError::ConfigError(
                    "[scripts].timeout must be greater than zero".to_string(),
                ));
            }
            Some(dur)
        }
    };

    Ok(ScriptsConfig {
        environment_scripts_enabled: raw.environment_scripts_enabled,
        shell: raw.shell,
        timeout,
    })
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
    }

    #[test]
    fn defaults_validate() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).expect("defaults are valid");
        assert_eq!(cfg.server.bind.port(), 8080);
        assert_eq!(cfg.terminal.cols, 80);
        assert_eq!(cfg.terminal.rows, 24);
        assert_eq!(cfg.terminal.term, "xterm");
        assert!(cfg.scripts.environment_scripts_enabled);
        assert!(cfg.scripts.timeout.is_none());
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.terminal.rows = 0;
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, TurtorialError::ConfigError(_)));
    }
}
