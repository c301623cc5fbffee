use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::StreamExt;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{
    ClientState, ConnectionManager, ConnectionState, DeepstreamClientBuilder,
    DeepstreamClientOptions,
};
use crate::infrastructure::{HeartbeatMonitor, ReconnectTimer};
use crate::messaging::{codec, MessageRouter};
use crate::types::constants::AUTH_WAIT_WINDOW;
use crate::types::{Action, DeepstreamError, DeepstreamMessage, Result, Topic};
use crate::websocket::WebSocketFactory;

/// The main entry point for talking to a deepstream-style server.
///
/// `DeepstreamClient` owns the WebSocket connection, drives the
/// challenge/authentication handshake, answers heartbeat pings, reconnects
/// with capped backoff when the socket drops, and buffers application sends
/// issued before authentication completes.
///
/// # Example
///
/// ```no_run
/// use deepstream_client_rs::{DeepstreamClient, DeepstreamClientOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = DeepstreamClient::new(
///         "ws://localhost:6020/deepstream",
///         DeepstreamClientOptions::default(),
///     )?;
///
///     client.connect(None).await?;
///     client.login().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DeepstreamClient {
    pub(crate) endpoint: String,
    pub(crate) options: DeepstreamClientOptions,

    // Socket owner and state cell
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,
}

impl DeepstreamClient {
    /// Creates a new client. This validates the endpoint URL and spawns the
    /// reconnection watcher but does not open a connection; call
    /// [`connect()`](Self::connect) or [`login()`](Self::login).
    ///
    /// # Errors
    ///
    /// Returns [`DeepstreamError::UrlParse`] if the endpoint URL cannot be
    /// parsed.
    pub fn new(endpoint: impl Into<String>, options: DeepstreamClientOptions) -> Result<Self> {
        DeepstreamClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Set connection state and notify watchers
    pub(crate) async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;

        let state = self.state.read().await;
        state.notify_state_change(new_state, state.deliberate_close);
    }

    /// Opens a connection to the configured endpoint (or `url`, which then
    /// overrides the configured endpoint for subsequent reconnects).
    ///
    /// Returns once the socket is open; the challenge/authentication
    /// handshake continues on the read task. If a connection is already open
    /// or in flight, this is a no-op.
    pub async fn connect(&self, url: Option<&str>) -> Result<()> {
        if !self.connection.begin_connect().await {
            return Ok(());
        }
        {
            let mut state = self.state.write().await;
            state.deliberate_close = false;
            if let Some(url) = url {
                state.url_override = Some(url.to_string());
            }
        }
        self.open_socket().await
    }

    /// Requests a login with the credentials supplied at construction (or by
    /// a previous [`login_with`](Self::login_with)).
    ///
    /// If the connection is already authenticating, the AUTH request is sent
    /// immediately; if there is no connection, one is opened and the login
    /// performed once the server acknowledges the challenge. Fails with
    /// [`DeepstreamError::AuthenticationRejected`] while the sticky
    /// challenge-denied flag is set; supply fresh credentials through
    /// `login_with` to clear it.
    pub async fn login(&self) -> Result<()> {
        self.login_inner(None).await
    }

    /// Requests a login with new credentials, replacing the configured ones
    /// wholesale and clearing the challenge-denied flag.
    pub async fn login_with<T: serde::Serialize>(&self, credentials: T) -> Result<()> {
        self.login_inner(Some(serde_json::to_value(credentials)?))
            .await
    }

    async fn login_inner(&self, credentials: Option<serde_json::Value>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match credentials {
                Some(credentials) => {
                    state.credentials = credentials;
                    state.challenge_denied = false;
                }
                None => {
                    if state.challenge_denied {
                        return Err(DeepstreamError::AuthenticationRejected);
                    }
                }
            }
            state.login_requested = true;
        }

        match self.connection.state().await {
            ConnectionState::Authenticating => self.send_auth_request().await,
            ConnectionState::Closed | ConnectionState::Error => self.connect(None).await,
            _ => Ok(()),
        }
    }

    /// Deliberately closes the connection and stops all background tasks.
    ///
    /// A deliberate close suppresses the automatic reconnect path; call
    /// [`connect()`](Self::connect) to reconnect.
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.deliberate_close = true;
            state.login_requested = false;
            state.logged_in = false;
            state.url_override = None;
            state.task_manager.abort_all();
            if let Some(heartbeat) = state.heartbeat_task.take() {
                heartbeat.abort();
            }
        }

        if self.options.verbose {
            tracing::info!("closing connection");
        }

        self.connection.close().await?;
        self.set_state(ConnectionState::Closed).await;
        Ok(())
    }

    /// Sends a message to the server.
    ///
    /// Messages that require authentication are buffered while the client is
    /// not logged in (subject to the configured message TTL) and flushed in
    /// FIFO order once AUTH/ACK arrives; if no connection is in flight, one
    /// is triggered. A write failing on a broken pipe is treated the same
    /// way.
    pub async fn send(&self, topic: Topic, action: Action, data: Vec<String>) -> Result<()> {
        let message = DeepstreamMessage::new(topic, action, data);
        self.send_or_buffer(message).await
    }

    async fn send_or_buffer(&self, message: DeepstreamMessage) -> Result<()> {
        // The logged-in check and the buffer offer share one critical
        // section: an AUTH/ACK flush cannot land between them and strand the
        // message past the one-time drain.
        let message = {
            let mut state = self.state.write().await;
            if message.needs_authentication() && !state.logged_in {
                state.buffer.offer(message);
                None
            } else {
                Some(message)
            }
        };
        let Some(message) = message else {
            self.connect_if_idle().await;
            return Ok(());
        };

        match self.connection.send_message(&message).await {
            Ok(()) => Ok(()),
            Err(DeepstreamError::WebSocket(error)) => {
                tracing::debug!("write failed, buffering message: {error}");
                {
                    let mut state = self.state.write().await;
                    state.logged_in = false;
                    state.buffer.offer(message);
                }
                // marks the state Closed and wakes the reconnection watcher
                self.handle_socket_closed().await;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn connect_if_idle(&self) {
        let current = self.connection.state().await;
        if matches!(current, ConnectionState::Closed | ConnectionState::Error) {
            let client = self.clone();
            tokio::spawn(async move {
                if let Err(error) = client.connect(None).await {
                    client
                        .options
                        .error_handler
                        .on_exception(DeepstreamError::ConnectionUnavailable(error.to_string()));
                }
            });
        }
    }

    /// Whether the socket is open and the handshake has completed
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Whether the reconnect loop is currently between attempts
    pub async fn is_reconnecting(&self) -> bool {
        self.connection.state().await == ConnectionState::Reconnecting
    }

    /// Whether AUTH/ACK was received on the current connection
    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.logged_in
    }

    /// Current lifecycle state
    pub async fn connection_state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Reconnection loop, entered whenever the socket closes without a
    /// deliberate `close()`. Retries with capped linear backoff until the
    /// handshake reaches `Open` or the attempt limit is exhausted, in which
    /// case the client parks in the terminal `Error` state.
    pub async fn try_reconnect(&self) -> Result<()> {
        {
            let state = self.state.read().await;
            if state.deliberate_close || state.challenge_denied {
                return Ok(());
            }
        }
        {
            let current = self.connection.state().await;
            if matches!(current, ConnectionState::Open | ConnectionState::Reconnecting) {
                return Ok(());
            }
        }

        let mut timer = ReconnectTimer::new(
            self.options.reconnect_interval,
            self.options.max_reconnect_interval,
            self.options.max_reconnect_attempts,
        );

        loop {
            if !timer.should_retry() {
                tracing::error!(
                    "giving up reconnecting after {} failed attempts",
                    timer.failed_attempts()
                );
                self.set_state(ConnectionState::Error).await;
                return Ok(());
            }

            if self.state.read().await.deliberate_close {
                // a close() raced the loop; settle back into Closed
                self.connection.set_state(ConnectionState::Closed).await;
                return Ok(());
            }

            self.set_state(ConnectionState::Reconnecting).await;
            {
                // re-login once the new connection is challenged
                self.state.write().await.login_requested = true;
            }

            match self.open_socket().await {
                Ok(()) => {
                    if self
                        .wait_for_open(Duration::from_millis(AUTH_WAIT_WINDOW))
                        .await
                    {
                        if self.options.verbose {
                            tracing::info!("reconnected");
                        }
                        return Ok(());
                    }
                    // socket opened but the handshake stalled
                    let _ = self.connection.close().await;
                    timer.record_failure();
                }
                Err(error) => {
                    timer.record_failure();
                    self.options
                        .error_handler
                        .on_exception(DeepstreamError::ConnectionUnavailable(error.to_string()));
                    // stay observably in Reconnecting across the backoff sleep
                    self.connection
                        .set_state(ConnectionState::Reconnecting)
                        .await;
                }
            }

            timer.schedule_timeout().await;
        }
    }

    /// Wait for the handshake to reach `Open`, bounded by `window`
    async fn wait_for_open(&self, window: Duration) -> bool {
        let mut rx = {
            let state = self.state.read().await;
            match &state.state_change_tx {
                Some(tx) => tx.subscribe(),
                None => return false,
            }
        };

        tokio::time::timeout(window, async {
            loop {
                if self.connection.state().await == ConnectionState::Open {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await
        .unwrap_or(false)
    }

    /// Open a socket to the current target and spawn the read task
    pub(crate) async fn open_socket(&self) -> Result<()> {
        let target = self.connection_target().await;
        self.set_state(ConnectionState::AwaitingConnection).await;

        if self.options.verbose {
            tracing::info!("connecting to {target}");
        }

        let ws_stream = match WebSocketFactory::create(&target).await {
            Ok(stream) => stream,
            Err(error) => {
                self.connection.set_state(ConnectionState::Closed).await;
                return Err(error);
            }
        };
        let (write_half, mut read_half) = ws_stream.split();
        self.connection.set_writer(write_half).await;

        let self_cloned = self.clone();
        let router = MessageRouter::new(self.clone());
        let mut state = self.state.write().await;
        state.task_manager.spawn(async move {
            tracing::debug!("starting read task");
            let mut close_reported = false;

            while let Some(msg_result) = read_half.next().await {
                match msg_result {
                    Ok(WsMessage::Text(text)) => match codec::decode(text.as_str()) {
                        Ok(messages) => {
                            for message in messages {
                                router.route(message).await;
                            }
                        }
                        Err(error) => self_cloned.options.error_handler.on_exception(error),
                    },
                    Ok(WsMessage::Close(frame)) => {
                        match frame {
                            Some(frame) => tracing::warn!(
                                "server closed connection: code={:?}, reason='{}'",
                                frame.code,
                                frame.reason
                            ),
                            None => tracing::warn!("server closed connection without close frame"),
                        }
                        self_cloned.handle_socket_closed().await;
                        close_reported = true;
                        break;
                    }
                    Ok(WsMessage::Ping(data)) => {
                        tracing::debug!("received transport ping ({} bytes)", data.len());
                    }
                    Ok(WsMessage::Pong(data)) => {
                        tracing::debug!("received transport pong ({} bytes)", data.len());
                    }
                    Ok(WsMessage::Binary(data)) => {
                        tracing::warn!("received unexpected binary message ({} bytes)", data.len());
                    }
                    Ok(WsMessage::Frame(_)) => {
                        tracing::debug!("received raw frame (internal)");
                    }
                    Err(error) => {
                        tracing::error!("WebSocket read error: {error}");
                        self_cloned.handle_socket_closed().await;
                        close_reported = true;
                        break;
                    }
                }
            }

            if !close_reported {
                self_cloned.handle_socket_closed().await;
            }
            tracing::debug!("read task finished");
        });

        Ok(())
    }

    /// Mark the connection closed and wake the reconnection watcher
    pub(crate) async fn handle_socket_closed(&self) {
        self.connection.clear_writer().await;
        self.connection.set_state(ConnectionState::Closed).await;

        let mut state = self.state.write().await;
        state.logged_in = false;
        // stop the monitor now; left running, it would survive into a quick
        // reconnect and double-report alongside the fresh monitor
        if let Some(heartbeat) = state.heartbeat_task.take() {
            heartbeat.abort();
        }
        let deliberate = state.deliberate_close;
        state.notify_state_change(ConnectionState::Closed, deliberate);
    }

    async fn connection_target(&self) -> String {
        self.state
            .read()
            .await
            .url_override
            .clone()
            .unwrap_or_else(|| self.endpoint.clone())
    }

    async fn send_auth_request(&self) -> Result<()> {
        let payload = {
            let state = self.state.read().await;
            serde_json::to_string(&state.credentials)?
        };
        let request = DeepstreamMessage::new(Topic::Auth, Action::Request, vec![payload]);
        self.connection.send_message(&request).await
    }

    // -- handshake transitions driven by the message router --

    /// CONNECTION/CHALLENGE: answer with the URL we connected to
    pub(crate) async fn on_challenge(&self) -> Result<()> {
        self.set_state(ConnectionState::Challenging).await;

        let target = self.connection_target().await;
        let response =
            DeepstreamMessage::new(Topic::Connection, Action::ChallengeResponse, vec![target]);
        self.connection.send_message(&response).await
    }

    /// CONNECTION/ACK: the challenge passed, authentication may begin
    pub(crate) async fn on_connection_ack(&self) -> Result<()> {
        self.set_state(ConnectionState::Authenticating).await;

        let should_login = {
            let state = self.state.read().await;
            self.options.autologin || state.login_requested
        };
        if should_login {
            self.send_auth_request().await
        } else {
            Ok(())
        }
    }

    /// AUTH/ACK: connection is fully open — flush the buffer, start the
    /// heartbeat monitor, resubscribe
    pub(crate) async fn on_auth_ack(&self) -> Result<()> {
        {
            // The logged-in flip and the buffer flush happen in one critical
            // section: a send arriving mid-flush either made it into the
            // drain, or waits and goes out after the replayed messages.
            let mut state = self.state.write().await;
            state.logged_in = true;
            state.login_requested = false;
            state.last_heartbeat = Instant::now();
            for message in state.buffer.drain() {
                self.connection.send_message(&message).await?;
            }
        }
        self.set_state(ConnectionState::Open).await;

        if self.options.verbose {
            tracing::info!("authenticated, connection open");
        }

        if let Some(interval_ms) = self.options.heartbeat_interval {
            let monitor = HeartbeatMonitor::new(
                Arc::downgrade(&self.connection),
                Arc::clone(&self.state),
                Arc::clone(&self.options.error_handler),
                Duration::from_millis(interval_ms),
            );
            monitor.spawn().await;
        }

        if let Some(handler) = &self.options.event_handler {
            handler.resubscribe();
        }

        Ok(())
    }

    /// CONNECTION/PING: record liveness, answer with exactly one PONG
    pub(crate) async fn on_ping(&self) -> Result<()> {
        {
            self.state.write().await.last_heartbeat = Instant::now();
        }
        let pong = DeepstreamMessage::new(Topic::Connection, Action::Pong, vec![]);
        self.connection.send_message(&pong).await
    }

    /// CONNECTION/REDIRECT: tear the socket down and reconnect to the new URL
    pub(crate) async fn on_redirect(&self, url: String) -> Result<()> {
        if self.options.verbose {
            tracing::info!("redirected to {url}");
        }
        {
            self.state.write().await.url_override = Some(url);
        }
        // the read task observes the close and triggers the reconnect path
        self.connection.close().await
    }

    /// CONNECTION/REJECTION: the server denied our challenge; sticky until a
    /// login with fresh credentials
    pub(crate) async fn on_rejection(&self) -> Result<()> {
        tracing::warn!("connection challenge rejected by server");
        {
            let mut state = self.state.write().await;
            state.challenge_denied = true;
            state.logged_in = false;
            state.login_requested = false;
        }
        self.connection.close().await?;
        self.set_state(ConnectionState::Closed).await;
        Ok(())
    }
}
