use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use url::Url;

use super::{ClientState, ConnectionManager, ConnectionState, DeepstreamClient};
use crate::handlers::{ErrorHandler, EventHandler, LoggingErrorHandler, RecordHandler};
use crate::types::constants::{
    DEFAULT_MAX_RECONNECT_INTERVAL, DEFAULT_MESSAGE_TTL, DEFAULT_RECONNECT_INTERVAL,
};
use crate::types::Result;

/// Client configuration. Immutable after construction; credentials may be
/// replaced wholesale through `login`.
#[derive(Clone)]
pub struct DeepstreamClientOptions {
    /// Arbitrary serializable credentials sent as JSON with AUTH/REQUEST
    pub credentials: serde_json::Value,
    /// Log in automatically once the connection challenge is acknowledged
    pub autologin: bool,
    /// Heartbeat liveness interval in milliseconds; absent disables the
    /// monitor
    pub heartbeat_interval: Option<u64>,
    /// Base delay between reconnection attempts (milliseconds)
    pub reconnect_interval: u64,
    /// Cap on the reconnection backoff delay (milliseconds)
    pub max_reconnect_interval: u64,
    /// Give up reconnecting after this many consecutive failures; absent
    /// retries forever
    pub max_reconnect_attempts: Option<u32>,
    /// Time-to-live for messages buffered while authentication is pending
    /// (milliseconds)
    pub message_ttl: u64,
    /// Emit connection-lifecycle logs at info level
    pub verbose: bool,

    /// EVENT-topic collaborator
    pub event_handler: Option<Arc<dyn EventHandler>>,
    /// RECORD-topic collaborator
    pub record_handler: Option<Arc<dyn RecordHandler>>,
    /// Error-reporting collaborator
    pub error_handler: Arc<dyn ErrorHandler>,
}

impl Default for DeepstreamClientOptions {
    fn default() -> Self {
        Self {
            credentials: serde_json::Value::Object(serde_json::Map::new()),
            autologin: true,
            heartbeat_interval: None,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_interval: DEFAULT_MAX_RECONNECT_INTERVAL,
            max_reconnect_attempts: None,
            message_ttl: DEFAULT_MESSAGE_TTL,
            verbose: false,
            event_handler: None,
            record_handler: None,
            error_handler: Arc::new(LoggingErrorHandler),
        }
    }
}

/// Builder for `DeepstreamClient` that handles initialization
pub struct DeepstreamClientBuilder {
    endpoint: String,
    options: DeepstreamClientOptions,
}

impl DeepstreamClientBuilder {
    /// Create a new builder, validating the endpoint URL
    pub fn new(endpoint: impl Into<String>, options: DeepstreamClientOptions) -> Result<Self> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)?;

        Ok(Self { endpoint, options })
    }

    /// Build the client and spawn the reconnection watcher
    pub fn build(self) -> DeepstreamClient {
        let mut client_state = ClientState::new(&self.options);

        let (state_tx, state_rx) = watch::channel((ConnectionState::Closed, false));
        client_state.state_change_tx = Some(state_tx);

        let client = DeepstreamClient {
            endpoint: self.endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(client_state)),
        };

        // Reconnection watcher: any non-deliberate transition to Closed
        // enters the reconnect loop, unless the server denied our challenge.
        let client_for_watcher = client.clone();
        tokio::spawn(async move {
            let mut rx = state_rx;

            while rx.changed().await.is_ok() {
                let (state, deliberate) = *rx.borrow_and_update();

                if state == ConnectionState::Closed && !deliberate {
                    if client_for_watcher.state.read().await.challenge_denied {
                        tracing::debug!("challenge denied, skipping automatic reconnect");
                        continue;
                    }

                    if let Err(e) = client_for_watcher.try_reconnect().await {
                        tracing::error!("reconnection watcher failed: {e}");
                    }
                }
            }
            tracing::debug!("reconnection watcher task finished");
        });

        client
    }
}
