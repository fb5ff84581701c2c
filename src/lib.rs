// src/lib.rs

pub mod cli;
pub mod config;
pub mod content;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod server;
pub mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::content::{load_catalog, LessonCatalog};
use crate::exec::{ShellCommandExecutor, StepRunner};
use crate::server::AppState;
use crate::terminal::SessionRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the lesson catalog
/// - the step runner and command executor
/// - the terminal session registry
/// - the HTTP server and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = config::resolve(args.config.as_deref())?;
    apply_overrides(&mut cfg, &args)?;

    let catalog = load_catalog(&cfg.lessons)?;

    if args.dry_run {
        print_dry_run(&cfg, &catalog);
        return Ok(());
    }

    if !cfg.scripts.environment_scripts_enabled {
        warn!("environment scripts disabled; before/after commands will be skipped");
    }

    let executor = ShellCommandExecutor::from_config(&cfg.scripts);
    let steps = StepRunner::new(
        Arc::new(catalog),
        Arc::new(executor),
        cfg.scripts.environment_scripts_enabled,
    );
    let registry = SessionRegistry::new(cfg.terminal.clone());
    let state = AppState::new(registry, steps);

    let listener = TcpListener::bind(cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;

    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    })
    .await
}

/// Fold command-line flags into the loaded config.
pub fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    if let Some(ref bind) = args.bind {
        cfg.server.bind = bind
            .parse()
            .with_context(|| format!("--bind '{bind}' is not a socket address"))?;
    }
    if let Some(ref dir) = args.lessons_dir {
        cfg.lessons.directory = dir.clone();
    }
    if args.dev_mode {
        cfg.lessons.dev_mode = true;
    }
    if args.disable_environment_scripts {
        cfg.scripts.environment_scripts_enabled = false;
    }
    Ok(())
}

/// Print the effective config and catalog without starting anything.
fn print_dry_run(cfg: &ConfigFile, catalog: &LessonCatalog) {
    println!("turtorial dry-run");
    println!("  server.bind = {}", cfg.server.bind);
    println!(
        "  terminal = {} {:?} (TERM={}, {}x{})",
        cfg.terminal.shell, cfg.terminal.args, cfg.terminal.term, cfg.terminal.cols, cfg.terminal.rows
    );
    println!(
        "  scripts.environment_scripts_enabled = {}",
        cfg.scripts.environment_scripts_enabled
    );
    if let Some(timeout) = cfg.scripts.timeout {
        println!("  scripts.timeout = {timeout:?}");
    }
    println!("  lessons.directory = {}", cfg.lessons.directory.display());
    println!();

    println!("lessons ({}):", catalog.len());
    for lesson in catalog.lessons() {
        println!("  - {} ({})", lesson.id, lesson.title);
        for step in &lesson.steps {
            println!("      {} ({})", step.id, step.title);
            if let Some(ref cmd) = step.before_command {
                println!("        before: {cmd}");
            }
            if let Some(ref cmd) = step.test_command {
                println!("        test: {cmd}");
            }
            if let Some(ref cmd) = step.after_command {
                println!("        after: {cmd}");
            }
        }
    }
}
