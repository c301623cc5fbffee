use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::buffer::OutgoingBuffer;
use super::builder::DeepstreamClientOptions;
use super::connection::ConnectionState;
use crate::infrastructure::TaskManager;

/// Consolidated mutable state for `DeepstreamClient`.
/// All mutation funnels through the client's methods under a single lock, so
/// the buffer, the flags, and the counters never need per-field locking.
pub struct ClientState {
    /// Messages awaiting authentication, FIFO
    pub buffer: OutgoingBuffer,

    /// Credentials sent as JSON with AUTH/REQUEST; replaced wholesale by
    /// `login`
    pub credentials: serde_json::Value,

    /// A login was requested (explicitly or by the reconnect path) and should
    /// be performed once the connection is ready
    pub login_requested: bool,

    /// AUTH/ACK received on the current connection
    pub logged_in: bool,

    /// `close()` was called; suppresses the automatic reconnect path
    pub deliberate_close: bool,

    /// Server sent CONNECTION/REJECTION; sticky until a login with fresh
    /// credentials
    pub challenge_denied: bool,

    /// Connection target override, set by CONNECTION/REDIRECT or an explicit
    /// `connect(url)`
    pub url_override: Option<String>,

    /// Last inbound CONNECTION/PING, watched by the heartbeat monitor
    pub last_heartbeat: Instant,

    /// Background task manager
    pub task_manager: TaskManager,

    /// Monitor for the current connection; aborted as soon as the socket
    /// closes so it cannot outlive its connection into the next one
    pub heartbeat_task: Option<JoinHandle<()>>,

    /// Sender for state change notifications: `(state, was_deliberate_close)`
    pub state_change_tx: Option<watch::Sender<(ConnectionState, bool)>>,
}

impl ClientState {
    pub fn new(options: &DeepstreamClientOptions) -> Self {
        Self {
            buffer: OutgoingBuffer::new(Duration::from_millis(options.message_ttl)),
            credentials: options.credentials.clone(),
            login_requested: false,
            logged_in: false,
            deliberate_close: false,
            challenge_denied: false,
            url_override: None,
            last_heartbeat: Instant::now(),
            task_manager: TaskManager::new(),
            heartbeat_task: None,
            state_change_tx: None,
        }
    }

    /// Notify state change watchers
    pub fn notify_state_change(&self, state: ConnectionState, deliberate: bool) {
        if let Some(tx) = &self.state_change_tx {
            if tx.send((state, deliberate)).is_err() {
                tracing::debug!(
                    "state change watcher disconnected, could not notify state: {:?}",
                    state
                );
            }
        }
    }
}
