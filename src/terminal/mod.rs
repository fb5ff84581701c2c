// src/terminal/mod.rs

//! Interactive terminal sessions.
//!
//! Each connection gets exactly one shell running behind a pseudo-terminal:
//! - [`session`] spawns the shell and owns the process, the PTY master and
//!   the output relay task.
//! - [`relay`] is the blocking loop that copies PTY output to the connection.
//! - [`registry`] maps connection identities to sessions and guarantees that
//!   removing a session always kills its process and stops its relay.
//!
//! Lifecycle: `Active` on successful spawn, `Closed` on explicit close,
//! connection drop, process exit or read error. Nothing leaves `Closed`.

pub mod registry;
pub mod relay;
pub mod session;

pub use registry::SessionRegistry;
pub use relay::RelayEnd;
pub use session::TerminalSession;

/// Lifecycle state of a [`TerminalSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closed,
}
