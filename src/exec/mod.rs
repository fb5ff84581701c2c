// src/exec/mod.rs

//! One-shot command execution.
//!
//! - [`command`] defines the [`CommandExecutor`] trait and the production
//!   [`ShellCommandExecutor`], which runs a command to completion with its
//!   output discarded at the OS level.
//! - [`steps`] holds the [`StepRunner`], which resolves a step's
//!   test/before/after command and applies the empty-command and
//!   environment-script policies before calling the executor.

pub mod command;
pub mod steps;

pub use command::{CommandExecutor, ExecFuture, ShellCommandExecutor};
pub use steps::{StepAction, StepRunner};
