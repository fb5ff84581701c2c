// src/terminal/registry.rs

//! Connection identity -> terminal session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::TerminalConfig;
use crate::errors::Result;
use crate::terminal::session::TerminalSession;

/// Owns every live [`TerminalSession`], keyed by connection identity.
///
/// Cheap to clone; clones share the same map. Every session leaves the map
/// exactly once, either through [`SessionRegistry::close`] or because its
/// relay stopped (process exit, connection gone, read error), and leaving
/// the map always terminates the process.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    config: TerminalConfig,
    sessions: Mutex<HashMap<String, Arc<TerminalSession>>>,
    next_serial: AtomicU64,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                sessions: Mutex::new(HashMap::new()),
                next_serial: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.inner.config
    }

    /// Spawn a shell for `id` and stream its output into `outbound`.
    ///
    /// A session already registered under `id` is closed first. On error
    /// nothing is registered.
    pub async fn open(&self, id: &str, outbound: mpsc::Sender<Vec<u8>>) -> Result<()> {
        if self.contains(id) {
            warn!(session = %id, "identity already has a session; replacing it");
            self.close(id).await;
        }

        let serial = self.inner.next_serial.fetch_add(1, Ordering::Relaxed);
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let reap_id = id.to_string();

        let session = TerminalSession::spawn(id, serial, &self.inner.config, outbound, move |end| {
            if let Some(inner) = weak.upgrade() {
                debug!(session = %reap_id, ?end, "relay ended; removing session");
                inner.reap(&reap_id, serial);
            }
        })?;

        let replaced = self.inner.lock().insert(id.to_string(), Arc::clone(&session));
        if let Some(old) = replaced {
            // A concurrent open for the same identity won the race above.
            shutdown(old, self.inner.config.close_grace).await;
        }

        // The relay may have stopped before the session was in the map, in
        // which case its own reap found nothing.
        if session.relay_finished() {
            let inner = Arc::clone(&self.inner);
            let id = id.to_string();
            let _ = tokio::task::spawn_blocking(move || inner.reap(&id, serial)).await;
        }

        Ok(())
    }

    /// Write `bytes` to the session's shell. Unknown or closed identities are
    /// ignored. A failed write closes the session.
    pub async fn input(&self, id: &str, bytes: Vec<u8>) {
        let Some(session) = self.get(id) else {
            debug!(session = %id, "input for unknown session ignored");
            return;
        };
        if !session.is_active() {
            return;
        }

        let writer = Arc::clone(&session);
        let res = tokio::task::spawn_blocking(move || writer.write(&bytes)).await;
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(session = %id, error = %e, "write to terminal failed; closing session");
                self.close(id).await;
            }
            Err(e) => {
                warn!(session = %id, error = %e, "terminal write task failed; closing session");
                self.close(id).await;
            }
        }
    }

    /// Update the PTY window size. Unknown identities are ignored.
    pub fn resize(&self, id: &str, cols: u16, rows: u16) -> Result<()> {
        match self.get(id) {
            Some(session) => session.resize(cols, rows),
            None => {
                debug!(session = %id, "resize for unknown session ignored");
                Ok(())
            }
        }
    }

    /// Remove the session, kill its process and wait for its relay.
    ///
    /// Idempotent: unknown or already-closed identities are a no-op.
    pub async fn close(&self, id: &str) {
        let removed = self.inner.lock().remove(id);
        match removed {
            Some(session) => shutdown(session, self.inner.config.close_grace).await,
            None => debug!(session = %id, "close for unknown session ignored"),
        }
    }

    /// Close every session.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.inner.lock().drain().map(|(_, s)| s).collect();
        if !drained.is_empty() {
            info!(sessions = drained.len(), "closing all terminal sessions");
        }
        for session in drained {
            shutdown(session, self.inner.config.close_grace).await;
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<TerminalSession>> {
        self.inner.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TerminalSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove and terminate `id` if it is still the session with `serial`.
    ///
    /// Runs on a blocking thread; never awaits the relay because it may be
    /// called from the relay itself.
    fn reap(&self, id: &str, serial: u64) {
        let removed = {
            let mut sessions = self.lock();
            let current = sessions.get(id).is_some_and(|s| s.serial() == serial);
            if current { sessions.remove(id) } else { None }
        };
        if let Some(session) = removed {
            session.terminate();
        }
    }
}

/// Terminate the process, then give the relay `grace` to notice.
async fn shutdown(session: Arc<TerminalSession>, grace: Duration) {
    let relay = session.take_relay();
    let id = session.id().to_string();

    let terminating = Arc::clone(&session);
    if let Err(e) = tokio::task::spawn_blocking(move || terminating.terminate()).await {
        warn!(session = %id, error = %e, "terminate task failed");
    }

    if let Some(relay) = relay {
        match tokio::time::timeout(grace, relay).await {
            Ok(Ok(())) => debug!(session = %id, "relay joined"),
            Ok(Err(e)) => warn!(session = %id, error = %e, "relay task failed"),
            Err(_) => warn!(
                session = %id,
                grace_ms = grace.as_millis() as u64,
                "relay still blocked after close; a background process may hold the terminal open"
            ),
        }
    }
}
