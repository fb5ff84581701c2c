// src/server/socket.rs

//! `GET /term`: one WebSocket, one shell.
//!
//! - Outbound: PTY output as text frames while it is UTF-8, binary frames for
//!   anything that is not.
//! - Inbound: binary or text frames are written to the shell verbatim, except
//!   a text frame that starts with NUL and carries a control message, e.g.
//!   `"\u{0}{\"type\":\"resize\",\"cols\":120,\"rows\":40}"`. Keystrokes and
//!   pastes do not produce NUL followed by JSON, so they reach the shell as is.

use std::borrow::Cow;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::server::AppState;

/// Chunks buffered between the relay and the socket before the relay blocks.
const OUTBOUND_BUFFER: usize = 64;

/// Out-of-band messages a client can send as a text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    Resize { cols: u16, rows: u16 },
}

/// Leading character that marks a text frame as a control message.
pub const CONTROL_PREFIX: char = '\u{0}';

impl ControlMessage {
    /// Interpret a text frame as a control message, if it is one.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix(CONTROL_PREFIX)?;
        serde_json::from_str(body).ok()
    }

    /// Wire form of this message, as a client would send it.
    pub fn encode(&self) -> String {
        match self {
            ControlMessage::Resize { cols, rows } => {
                format!("{CONTROL_PREFIX}{{\"type\":\"resize\",\"cols\":{cols},\"rows\":{rows}}}")
            }
        }
    }
}

/// Turns relay chunks into WebSocket frames.
///
/// A multi-byte character split across two chunks is held back until its
/// tail arrives. Bytes that can never be UTF-8 go out unchanged in a binary
/// frame.
#[derive(Debug, Default)]
struct OutputFramer {
    pending: Vec<u8>,
}

impl OutputFramer {
    fn frame(&mut self, chunk: Vec<u8>) -> Option<Message> {
        let bytes = if self.pending.is_empty() {
            chunk
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(&chunk);
            joined
        };

        let err = match String::from_utf8(bytes) {
            Ok(text) => return Some(Message::Text(text)),
            Err(err) => err,
        };
        let utf8 = err.utf8_error();
        let mut bytes = err.into_bytes();
        if utf8.error_len().is_some() {
            return Some(Message::Binary(bytes));
        }

        // Only an incomplete character at the end.
        self.pending = bytes.split_off(utf8.valid_up_to());
        if bytes.is_empty() {
            return None;
        }
        match String::from_utf8(bytes) {
            Ok(text) => Some(Message::Text(text)),
            Err(err) => Some(Message::Binary(err.into_bytes())),
        }
    }

    /// Whatever is still held back once output has ended.
    fn finish(self) -> Option<Message> {
        (!self.pending.is_empty()).then(|| Message::Binary(self.pending))
    }
}

pub async fn terminal_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let id = state.next_connection_id();
    info!(session = %id, "terminal connection established");

    let (outbound_tx, outbound_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_BUFFER);
    if let Err(e) = state.registry.open(&id, outbound_tx).await {
        error!(session = %id, error = %e, "failed to start terminal");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: Cow::from("failed to start terminal"),
            })))
            .await;
        return;
    }

    let (sink, stream) = socket.split();
    let mut send_task = tokio::spawn(pump_output(outbound_rx, sink));
    let mut recv_task = tokio::spawn(pump_input(stream, state.clone(), id.clone()));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.close(&id).await;
    info!(session = %id, "terminal connection closed");
}

/// Forward relay output to the socket. Ends when the relay stops (the shell
/// exited) or the socket stops accepting frames.
async fn pump_output(mut outbound: mpsc::Receiver<Vec<u8>>, mut sink: SplitSink<WebSocket, Message>) {
    let mut framer = OutputFramer::default();
    while let Some(bytes) = outbound.recv().await {
        let Some(msg) = framer.frame(bytes) else {
            continue;
        };
        if sink.send(msg).await.is_err() {
            return;
        }
    }
    if let Some(msg) = framer.finish() {
        if sink.send(msg).await.is_err() {
            return;
        }
    }

    let _ = sink
        .send(Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Cow::from("terminal exited"),
        })))
        .await;
}

/// Apply inbound frames to the session until the client goes away.
async fn pump_input(mut stream: SplitStream<WebSocket>, state: AppState, id: String) {
    while let Some(frame) = stream.next().await {
        let msg = match frame {
            Ok(msg) => msg,
            Err(e) => {
                debug!(session = %id, error = %e, "websocket receive error");
                return;
            }
        };

        match msg {
            Message::Text(text) => match ControlMessage::parse(&text) {
                Some(ControlMessage::Resize { cols, rows }) => {
                    if let Err(e) = state.registry.resize(&id, cols, rows) {
                        warn!(session = %id, error = %e, "resize failed");
                    }
                }
                None => state.registry.input(&id, text.into_bytes()).await,
            },
            Message::Binary(bytes) => state.registry.input(&id, bytes).await,
            Message::Close(_) => return,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}
