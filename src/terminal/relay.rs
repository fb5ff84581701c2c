// src/terminal/relay.rs

//! PTY output relay.
//!
//! The PTY reader is a blocking `std::io::Read`, so the relay runs on the
//! blocking pool and forwards chunks through a bounded channel with
//! `blocking_send`. A slow connection therefore back-pressures the shell
//! instead of growing an unbounded buffer.

use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Linux reports `EIO` on the master once every slave descriptor is closed,
/// i.e. the shell (and anything it left behind) has exited.
const EIO: i32 = 5;

const READ_BUFFER_SIZE: usize = 8192;

/// Why a relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// The session was closed explicitly.
    Cancelled,
    /// The process side of the terminal closed.
    ProcessExited,
    /// The connection stopped accepting output.
    ConnectionClosed,
    /// An unexpected read error.
    ReadError,
}

/// Copy bytes from `reader` to `outbound` until one side goes away or
/// `cancelled` is set.
pub fn relay_output(
    session: &str,
    mut reader: Box<dyn Read + Send>,
    outbound: mpsc::Sender<Vec<u8>>,
    cancelled: Arc<AtomicBool>,
) -> RelayEnd {
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        if cancelled.load(Ordering::Acquire) {
            return RelayEnd::Cancelled;
        }

        let read = reader.read(&mut buf);
        // A close kills the shell, which surfaces here as EOF or EIO.
        if cancelled.load(Ordering::Acquire) {
            return RelayEnd::Cancelled;
        }

        let n = match read {
            Ok(0) => return RelayEnd::ProcessExited,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.raw_os_error() == Some(EIO) => return RelayEnd::ProcessExited,
            Err(e) => {
                warn!(session = %session, error = %e, "error reading from terminal");
                return RelayEnd::ReadError;
            }
        };

        trace!(session = %session, bytes = n, "relaying terminal output");
        if outbound.blocking_send(buf[..n].to_vec()).is_err() {
            debug!(session = %session, "connection receiver dropped");
            return RelayEnd::ConnectionClosed;
        }
    }
}
