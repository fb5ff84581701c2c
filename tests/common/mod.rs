#![allow(dead_code)]

pub use turtorial_test_utils::builders;
pub use turtorial_test_utils::recording_executor::RecordingExecutor;
pub use turtorial_test_utils::{init_tracing, with_timeout};
