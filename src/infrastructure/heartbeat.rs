use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{self, MissedTickBehavior};

use crate::client::{ClientState, ConnectionManager, ConnectionState};
use crate::handlers::ErrorHandler;
use crate::types::DeepstreamError;

/// Liveness monitor for the server-initiated PING/PONG exchange.
///
/// The router records every inbound CONNECTION/PING as the last-heartbeat
/// instant; this task checks each interval whether more than two intervals
/// elapsed without one. On timeout it reports through the error handler and
/// forces the connection closed — reconnection is then driven by the normal
/// close path, not by the monitor.
///
/// The close path aborts the monitor as soon as the socket drops; a
/// reconnect spawns a fresh one. As a fallback the task also exits on its
/// own once the state leaves `Open` or the client is dropped.
pub struct HeartbeatMonitor {
    interval: Duration,
    connection: Weak<ConnectionManager>,
    state: Arc<RwLock<ClientState>>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl HeartbeatMonitor {
    pub fn new(
        connection: Weak<ConnectionManager>,
        state: Arc<RwLock<ClientState>>,
        error_handler: Arc<dyn ErrorHandler>,
        interval: Duration,
    ) -> Self {
        Self {
            interval,
            connection,
            state,
            error_handler,
        }
    }

    /// Spawn the monitor into the client's heartbeat slot, aborting any
    /// monitor left over from a previous connection
    pub async fn spawn(self) {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(self.run());
        if let Some(old) = state.write().await.heartbeat_task.replace(handle) {
            old.abort();
        };
    }

    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let connection = match self.connection.upgrade() {
                Some(conn) => conn,
                None => break,
            };

            if connection.state().await != ConnectionState::Open {
                break;
            }

            let last_heartbeat = self.state.read().await.last_heartbeat;
            if last_heartbeat.elapsed() <= self.interval * 2 {
                continue;
            }

            tracing::error!("heartbeat timeout, closing connection");
            self.error_handler
                .on_exception(DeepstreamError::HeartbeatTimeout);

            let _ = connection.close().await;
            {
                let mut state = self.state.write().await;
                state.logged_in = false;
                let deliberate = state.deliberate_close;
                state.notify_state_change(ConnectionState::Closed, deliberate);
            }
            break;
        }
    }
}
