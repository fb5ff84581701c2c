// src/terminal/session.rs

//! One shell process bound to a pseudo-terminal.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::errors::{Result, TurtorialError};
use crate::terminal::SessionState;
use crate::terminal::relay::{RelayEnd, relay_output};

/// A live shell behind a PTY together with its output relay.
///
/// The session owns the child process, the PTY master and the relay task.
/// [`TerminalSession::terminate`] releases the process; the registry takes
/// care of awaiting the relay.
pub struct TerminalSession {
    id: String,
    serial: u64,
    pid: Option<u32>,
    state: Mutex<SessionState>,
    size: Mutex<(u16, u16)>,
    writer: Mutex<Box<dyn Write + Send>>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    cancelled: Arc<AtomicBool>,
    relay_done: Arc<AtomicBool>,
    relay: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl TerminalSession {
    /// Spawn the configured shell in a fresh PTY and start the relay.
    ///
    /// `on_relay_end` runs on the relay thread once the relay stops for any
    /// reason other than an explicit close.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(
        id: &str,
        serial: u64,
        cfg: &TerminalConfig,
        outbound: mpsc::Sender<Vec<u8>>,
        on_relay_end: F,
    ) -> Result<Arc<Self>>
    where
        F: FnOnce(RelayEnd) + Send + 'static,
    {
        let spawn_failed = |e: anyhow::Error| TurtorialError::SpawnFailed {
            session: id.to_string(),
            message: format!("{e:#}"),
        };

        let cols = cfg.cols.max(1);
        let rows = cfg.rows.max(1);

        let pair = native_pty_system()
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("allocating pseudo-terminal")
            .map_err(spawn_failed)?;

        // CommandBuilder starts from the server's environment.
        let mut cmd = CommandBuilder::new(&cfg.shell);
        cmd.args(cfg.args.iter().map(String::as_str));
        cmd.env("TERM", &cfg.term);
        if let Some(ref cwd) = cfg.cwd {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("spawning shell '{}'", cfg.shell))
            .map_err(spawn_failed)?;
        // The relay only sees EOF once no slave descriptor is left in this
        // process.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .context("cloning terminal reader")
            .map_err(spawn_failed)?;
        let writer = pair
            .master
            .take_writer()
            .context("taking terminal writer")
            .map_err(spawn_failed)?;

        let pid = child.process_id();
        let cancelled = Arc::new(AtomicBool::new(false));
        let relay_done = Arc::new(AtomicBool::new(false));

        let relay = {
            let session = id.to_string();
            let cancelled = Arc::clone(&cancelled);
            let relay_done = Arc::clone(&relay_done);
            tokio::task::spawn_blocking(move || {
                let end = relay_output(&session, reader, outbound, cancelled);
                relay_done.store(true, Ordering::Release);
                debug!(session = %session, ?end, "terminal relay stopped");
                if end != RelayEnd::Cancelled {
                    on_relay_end(end);
                }
            })
        };

        info!(session = %id, pid = ?pid, shell = %cfg.shell, cols, rows, "terminal session started");

        Ok(Arc::new(Self {
            id: id.to_string(),
            serial,
            pid,
            state: Mutex::new(SessionState::Active),
            size: Mutex::new((cols, rows)),
            writer: Mutex::new(writer),
            master: Mutex::new(pair.master),
            child: Mutex::new(child),
            cancelled,
            relay_done,
            relay: Mutex::new(Some(relay)),
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Distinguishes successive sessions opened under the same identity.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Current `(cols, rows)`.
    pub fn size(&self) -> (u16, u16) {
        *lock(&self.size)
    }

    pub(crate) fn relay_finished(&self) -> bool {
        self.relay_done.load(Ordering::Acquire)
    }

    pub(crate) fn take_relay(&self) -> Option<JoinHandle<()>> {
        lock(&self.relay).take()
    }

    /// Write `bytes` verbatim to the shell. Blocking; writers are serialized.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let mut writer = lock(&self.writer);
        let written = writer.write_all(bytes);
        written
            .and_then(|()| writer.flush())
            .map_err(|e| TurtorialError::TerminalIo {
                session: self.id.clone(),
                message: e.to_string(),
            })
    }

    /// Change the window geometry. Zero dimensions are clamped to 1.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let cols = cols.max(1);
        let rows = rows.max(1);

        lock(&self.master)
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TurtorialError::TerminalIo {
                session: self.id.clone(),
                message: format!("{e:#}"),
            })?;

        *lock(&self.size) = (cols, rows);
        debug!(session = %self.id, cols, rows, "terminal resized");
        Ok(())
    }

    /// Move to `Closed`: stop the relay from forwarding, kill whatever is left
    /// of the shell's session and reap the shell.
    ///
    /// Blocking. Returns `false` if the session was already closed.
    pub fn terminate(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == SessionState::Closed {
                return false;
            }
            *state = SessionState::Closed;
        }
        self.cancelled.store(true, Ordering::Release);

        let mut child = lock(&self.child);
        // Not yet reaped, so the pid cannot have been reused.
        if let Some(pid) = self.pid {
            kill_session(&self.id, pid);
        }
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(session = %self.id, exit_code = status.exit_code(), "shell had already exited");
            }
            _ => {
                if let Err(e) = child.kill() {
                    debug!(session = %self.id, error = %e, "kill failed; process may have just exited");
                }
                match child.wait() {
                    Ok(status) => {
                        debug!(session = %self.id, exit_code = status.exit_code(), "shell reaped");
                    }
                    Err(e) => warn!(session = %self.id, error = %e, "failed to reap shell process"),
                }
            }
        }

        info!(session = %self.id, pid = ?self.pid, "terminal session closed");
        true
    }
}

/// SIGKILL everything left in the shell's session.
///
/// The shell is a session leader. Background jobs it started keep its session
/// id even when job control moved them into their own process group, and they
/// would otherwise hold the terminal open after the shell is gone.
fn kill_session(session: &str, leader: u32) {
    let Ok(raw) = i32::try_from(leader) else {
        return;
    };
    let sid = Pid::from_raw(raw);

    // The leader's own group first; on Linux also every other group.
    if let Err(e) = killpg(sid, Signal::SIGKILL) {
        if e != Errno::ESRCH {
            debug!(session = %session, error = %e, "killing shell process group failed");
        }
    }

    #[cfg(target_os = "linux")]
    {
        use nix::sys::signal::kill;
        use nix::unistd::getsid;

        let Ok(entries) = std::fs::read_dir("/proc") else {
            return;
        };
        let mut killed = 0usize;
        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i32>().ok())
                .map(Pid::from_raw)
            else {
                continue;
            };
            if getsid(Some(pid)) == Ok(sid) && kill(pid, Signal::SIGKILL).is_ok() {
                killed += 1;
            }
        }
        if killed > 0 {
            debug!(session = %session, processes = killed, "killed leftover session processes");
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
