use std::sync::{Arc, Mutex};

use turtorial::exec::{CommandExecutor, ExecFuture};

/// A fake executor that:
/// - records every command it is asked to run
/// - never spawns a process
/// - answers with a fixed outcome.
#[derive(Clone)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    outcome: bool,
}

impl RecordingExecutor {
    pub fn succeeding() -> Self {
        Self::with_outcome(true)
    }

    pub fn failing() -> Self {
        Self::with_outcome(false)
    }

    pub fn with_outcome(outcome: bool) -> Self {
        Self {
            executed: Arc::new(Mutex::new(Vec::new())),
            outcome,
        }
    }

    /// Commands seen so far, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute<'a>(&'a self, command: &'a str) -> ExecFuture<'a> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(command.to_string());
            self.outcome
        })
    }
}
