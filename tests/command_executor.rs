// tests/command_executor.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use turtorial::exec::{CommandExecutor, ShellCommandExecutor};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn exit_status_zero_is_success_and_anything_else_is_failure() {
    init_tracing();
    let exec = ShellCommandExecutor::default();

    for code in [0, 1, 2, 7, 42, 127, 255] {
        let ok = with_timeout(exec.execute(&format!("exit {code}"))).await;
        assert_eq!(ok, code == 0, "exit {code}");
    }
    assert!(exec.execute("true").await);
    assert!(!exec.execute("false").await);
}

#[tokio::test]
async fn compound_commands_are_interpreted_by_the_shell() {
    init_tracing();
    let exec = ShellCommandExecutor::default();

    assert!(exec.execute("true && test 1 -eq 1").await);
    assert!(!exec.execute("true && test 1 -eq 2").await);
    assert!(exec.execute("false || true").await);
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_stall() {
    init_tracing();
    let exec = ShellCommandExecutor::default();

    let ok = with_timeout(exec.execute(
        "head -c 8000000 /dev/zero; head -c 8000000 /dev/zero >&2; exit 0",
    ))
    .await;
    assert!(ok);

    let ok = with_timeout(exec.execute("head -c 4000000 /dev/zero >&2; exit 3")).await;
    assert!(!ok);
}

#[tokio::test]
async fn stdin_is_empty() {
    init_tracing();
    let exec = ShellCommandExecutor::default();

    // `cat` sees end-of-input immediately; `read` fails on it.
    assert!(with_timeout(exec.execute("cat")).await);
    assert!(!with_timeout(exec.execute("read line")).await);
}

#[tokio::test]
async fn side_effects_are_visible_after_completion() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let marker = dir.path().join("created");
    let exec = ShellCommandExecutor::default();

    assert!(exec.execute(&format!("touch '{}'", marker.display())).await);
    assert!(marker.exists());

    assert!(exec.execute(&format!("test -f '{}'", marker.display())).await);
    assert!(exec.execute(&format!("rm '{}'", marker.display())).await);
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_reported_as_false() {
    init_tracing();
    let exec = ShellCommandExecutor::new("/nonexistent/turtorial-shell", None);
    assert!(!exec.execute("true").await);
}

#[tokio::test]
async fn timeout_kills_a_runaway_command() {
    init_tracing();
    let exec = ShellCommandExecutor::new("sh", Some(Duration::from_millis(200)));

    let started = Instant::now();
    let ok = with_timeout(exec.execute("sleep 30")).await;
    assert!(!ok);
    assert!(started.elapsed() < Duration::from_secs(5));

    // Quick commands are unaffected.
    assert!(exec.execute("true").await);
}

#[tokio::test]
async fn concurrent_invocations_are_independent() {
    init_tracing();
    let exec = ShellCommandExecutor::default();

    let (a, b, c) = tokio::join!(
        exec.execute("sleep 0.2; exit 0"),
        exec.execute("sleep 0.1; exit 1"),
        exec.execute("exit 0"),
    );
    assert!(a);
    assert!(!b);
    assert!(c);
}
