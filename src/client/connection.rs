use futures::stream::SplitSink;
use futures::SinkExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::messaging::codec;
use crate::types::{error::Result, message::DeepstreamMessage};

/// Connection lifecycle state.
///
/// `Closed` and `Error` are terminal until an explicit `connect()`/`login()`;
/// `Open` is the only state in which user-level sends go straight to the
/// socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    AwaitingConnection,
    Challenging,
    Authenticating,
    Open,
    Reconnecting,
    Error,
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Exclusive owner of the socket write half and the connection state cell.
///
/// The write half is replaced (never shared) on reconnect or redirect; the
/// previous half is closed before a new one is installed.
pub struct ConnectionManager {
    ws_write: Arc<RwLock<Option<WsSink>>>,
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: Arc::new(RwLock::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Closed)),
        }
    }

    /// Install the write half of a freshly opened socket, closing any prior
    /// one first.
    pub async fn set_writer(&self, writer: WsSink) {
        let mut ws = self.ws_write.write().await;
        if let Some(old) = ws.as_mut() {
            let _ = old.close().await;
        }
        *ws = Some(writer);
    }

    /// Gets the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Sets the connection state
    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        *state = new_state;
    }

    /// Atomically claim a fresh connection attempt: transitions to
    /// `AwaitingConnection` only from a terminal state. Returns false when a
    /// connection is already open or in flight, so concurrent connect
    /// triggers collapse into one.
    pub async fn begin_connect(&self) -> bool {
        let mut state = self.state.write().await;
        if matches!(
            *state,
            ConnectionState::Closed | ConnectionState::Error
        ) {
            *state = ConnectionState::AwaitingConnection;
            true
        } else {
            false
        }
    }

    /// Checks if the connection is open
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Open
    }

    /// Encode and write a single message. A missing writer is tolerated so
    /// handshake replies issued while the socket is being replaced do not
    /// error; a failed write surfaces as a `WebSocket` error for the engine's
    /// buffer-and-reconnect path.
    pub async fn send_message(&self, message: &DeepstreamMessage) -> Result<()> {
        let frame = codec::encode(message);

        let mut ws_guard = self.ws_write.write().await;
        if let Some(ws) = ws_guard.as_mut() {
            ws.send(Message::Text(frame.into())).await?;
        }

        Ok(())
    }

    /// Closes the socket gracefully and drops the writer
    pub async fn close(&self) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        if let Some(ws) = ws_guard.as_mut() {
            let _ = ws.close().await;
        }
        *ws_guard = None;

        self.set_state(ConnectionState::Closed).await;

        Ok(())
    }

    /// Drops the writer without a close handshake (used when the read half
    /// already observed the socket closing)
    pub async fn clear_writer(&self) {
        let mut ws = self.ws_write.write().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
