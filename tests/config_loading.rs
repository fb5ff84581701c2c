// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use turtorial::config::load_and_validate;
use turtorial::errors::TurtorialError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.server.bind.to_string(), "127.0.0.1:8080");
    assert_eq!(cfg.terminal.shell, "/bin/bash");
    assert_eq!(cfg.terminal.args, vec!["-l"]);
    assert_eq!(cfg.terminal.term, "xterm");
    assert_eq!((cfg.terminal.cols, cfg.terminal.rows), (80, 24));
    assert!(cfg.scripts.environment_scripts_enabled);
    assert_eq!(cfg.scripts.shell, "sh");
    assert_eq!(cfg.scripts.timeout, None);
    assert!(!cfg.lessons.dev_mode);
    assert!(cfg.lessons.fail_on_error);
}

#[test]
fn every_section_can_be_overridden() {
    let file = write_config(
        r#"
[server]
bind = "0.0.0.0:9000"

[terminal]
shell = "/bin/zsh"
args = []
term = "xterm-256color"
cols = 132
rows = 43
cwd = "/tmp"
close_grace = "500ms"

[scripts]
environment_scripts_enabled = false
shell = "/bin/bash"
timeout = "30s"

[lessons]
directory = "content/lessons"
dev_mode = true
fail_on_error = false
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.server.bind.port(), 9000);
    assert_eq!(cfg.terminal.shell, "/bin/zsh");
    assert!(cfg.terminal.args.is_empty());
    assert_eq!(cfg.terminal.term, "xterm-256color");
    assert_eq!((cfg.terminal.cols, cfg.terminal.rows), (132, 43));
    assert_eq!(cfg.terminal.cwd.as_deref(), Some(std::path::Path::new("/tmp")));
    assert_eq!(cfg.terminal.close_grace, Duration::from_millis(500));
    assert!(!cfg.scripts.environment_scripts_enabled);
    assert_eq!(cfg.scripts.timeout, Some(Duration::from_secs(30)));
    assert_eq!(cfg.lessons.directory, std::path::PathBuf::from("content/lessons"));
    assert!(cfg.lessons.dev_mode);
    assert!(!cfg.lessons.fail_on_error);
}

#[test]
fn unknown_section_is_a_toml_error() {
    let file = write_config("[nonsense]\nkey = 1\n");
    match load_and_validate(file.path()) {
        Err(TurtorialError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn invalid_bind_address_returns_config_error() {
    let file = write_config("[server]\nbind = \"localhost\"\n");
    match load_and_validate(file.path()) {
        Err(TurtorialError::ConfigError(msg)) => assert!(msg.contains("[server].bind")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn zero_timeout_returns_config_error() {
    let file = write_config("[scripts]\ntimeout = \"0s\"\n");
    match load_and_validate(file.path()) {
        Err(TurtorialError::ConfigError(msg)) => assert!(msg.contains("timeout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_duration_returns_config_error() {
    let file = write_config("[terminal]\nclose_grace = \"soon\"\n");
    match load_and_validate(file.path()) {
        Err(TurtorialError::ConfigError(msg)) => assert!(msg.contains("close_grace")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unreadable_file_error_names_the_path() {
    match load_and_validate("/nonexistent/Turtorial.toml") {
        Err(TurtorialError::ConfigError(msg)) => {
            assert!(msg.contains("/nonexistent/Turtorial.toml"), "message was {msg}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[server]\nbind = \"\xff\xfe\"\n").unwrap();
    match load_and_validate(file.path()) {
        Err(TurtorialError::ConfigError(msg)) => {
            assert!(msg.contains(&format!("{:?}", file.path())), "message was {msg}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
