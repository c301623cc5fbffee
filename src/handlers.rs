//! Collaborator traits consumed by the connection engine.
//!
//! The engine dispatches decoded messages by topic: EVENT and RECORD messages
//! go to their respective handlers verbatim, server-reported errors and
//! client-side dispatch failures go to the error handler. Handlers are plain
//! trait objects held by the client; they must not call back into the client
//! synchronously from within these callbacks.

use crate::types::{DeepstreamError, DeepstreamMessage};

/// Receives EVENT-topic messages and re-establishes subscriptions after a
/// reconnect. Resubscription runs after the outgoing buffer has been drained.
pub trait EventHandler: Send + Sync {
    fn on_message(&self, message: DeepstreamMessage);

    fn resubscribe(&self) {}
}

/// Receives RECORD-topic messages.
pub trait RecordHandler: Send + Sync {
    fn on_message(&self, message: DeepstreamMessage);
}

/// Receives server-reported errors and client-side failures caught at the
/// dispatch boundary.
pub trait ErrorHandler: Send + Sync {
    /// An ERROR-topic message forwarded from the server.
    fn on_error(&self, message: DeepstreamMessage);

    /// A failure raised while handling an inbound message or maintaining the
    /// connection (decode errors, unsupported features, heartbeat timeout,
    /// reconnect failures).
    fn on_exception(&self, error: DeepstreamError);
}

/// Default error handler that reports through `tracing`.
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn on_error(&self, message: DeepstreamMessage) {
        tracing::error!(
            "server error: {} {} {:?}",
            message.topic.as_token(),
            message.action.as_token(),
            message.data
        );
    }

    fn on_exception(&self, error: DeepstreamError) {
        tracing::error!("client error: {error}");
    }
}
