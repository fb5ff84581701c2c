// src/exec/steps.rs

//! Step-level policy around [`CommandExecutor`].
//!
//! Decides *whether* a command runs; the executor decides how.

use std::sync::Arc;

use tracing::debug;

use crate::content::{ContentProvider, Step};
use crate::exec::command::CommandExecutor;

/// Which of a step's commands to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// `testCommand`: pass/fail verification. Never gated.
    Verify,
    /// `before`: environment setup. Gated by `environment_scripts_enabled`.
    Before,
    /// `after`: environment teardown. Gated by `environment_scripts_enabled`.
    After,
}

impl StepAction {
    fn is_environment_script(self) -> bool {
        matches!(self, StepAction::Before | StepAction::After)
    }

    fn command_of(self, step: &Step) -> Option<&str> {
        match self {
            StepAction::Verify => step.test_command.as_deref(),
            StepAction::Before => step.before_command.as_deref(),
            StepAction::After => step.after_command.as_deref(),
        }
    }
}

/// Resolves steps and runs their commands.
///
/// Anything that has nothing to run (unknown lesson or step, missing or empty
/// command, disabled environment scripts) is a success and spawns nothing.
pub struct StepRunner<C, E> {
    content: Arc<C>,
    executor: Arc<E>,
    environment_scripts_enabled: bool,
}

impl<C, E> Clone for StepRunner<C, E> {
    fn clone(&self) -> Self {
        Self {
            content: Arc::clone(&self.content),
            executor: Arc::clone(&self.executor),
            environment_scripts_enabled: self.environment_scripts_enabled,
        }
    }
}

impl<C: ContentProvider, E: CommandExecutor> StepRunner<C, E> {
    pub fn new(content: Arc<C>, executor: Arc<E>, environment_scripts_enabled: bool) -> Self {
        Self {
            content,
            executor,
            environment_scripts_enabled,
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn environment_scripts_enabled(&self) -> bool {
        self.environment_scripts_enabled
    }

    pub async fn verify(&self, lesson_id: &str, step_id: &str) -> bool {
        self.run(StepAction::Verify, lesson_id, step_id).await
    }

    pub async fn run_before(&self, lesson_id: &str, step_id: &str) -> bool {
        self.run(StepAction::Before, lesson_id, step_id).await
    }

    pub async fn run_after(&self, lesson_id: &str, step_id: &str) -> bool {
        self.run(StepAction::After, lesson_id, step_id).await
    }

    pub async fn run(&self, action: StepAction, lesson_id: &str, step_id: &str) -> bool {
        if action.is_environment_script() && !self.environment_scripts_enabled {
            debug!(lesson = %lesson_id, step = %step_id, ?action, "environment scripts disabled; skipping");
            return true;
        }

        let command = self
            .content
            .find_step(lesson_id, step_id)
            .and_then(|step| action.command_of(step))
            .filter(|cmd| !cmd.trim().is_empty());

        match command {
            Some(cmd) => self.executor.execute(cmd).await,
            None => {
                debug!(lesson = %lesson_id, step = %step_id, ?action, "nothing to run");
                true
            }
        }
    }
}
