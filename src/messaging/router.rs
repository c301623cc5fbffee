use crate::client::DeepstreamClient;
use crate::types::{Action, DeepstreamError, DeepstreamMessage, Result, Topic};

/// Routes decoded inbound messages by topic.
///
/// AUTH and CONNECTION messages drive the engine's state machine; EVENT,
/// RECORD, and ERROR messages are forwarded to the collaborator handlers.
/// Every failure raised while handling a message is caught here and funneled
/// to the error handler, so one malformed message cannot crash the engine.
pub struct MessageRouter {
    client: DeepstreamClient,
}

impl MessageRouter {
    pub fn new(client: DeepstreamClient) -> Self {
        Self { client }
    }

    pub async fn route(&self, message: DeepstreamMessage) {
        tracing::debug!(
            "routing message: topic={}, action={}, data={:?}",
            message.topic.as_token(),
            message.action.as_token(),
            message.data
        );

        if let Err(error) = self.dispatch(message).await {
            self.client.options.error_handler.on_exception(error);
        }
    }

    async fn dispatch(&self, message: DeepstreamMessage) -> Result<()> {
        match message.topic {
            Topic::Connection => self.handle_connection(message).await,
            Topic::Auth => self.handle_auth(message).await,
            Topic::Event => {
                match &self.client.options.event_handler {
                    Some(handler) => handler.on_message(message),
                    None => tracing::debug!("no event handler registered, dropping message"),
                }
                Ok(())
            }
            Topic::Record => {
                match &self.client.options.record_handler {
                    Some(handler) => handler.on_message(message),
                    None => tracing::debug!("no record handler registered, dropping message"),
                }
                Ok(())
            }
            Topic::Error => {
                self.client.options.error_handler.on_error(message);
                Ok(())
            }
            Topic::Rpc => Err(DeepstreamError::UnsupportedFeature("RPC")),
        }
    }

    async fn handle_connection(&self, message: DeepstreamMessage) -> Result<()> {
        match message.action {
            Action::Challenge => self.client.on_challenge().await,
            Action::Ack => self.client.on_connection_ack().await,
            Action::Ping => self.client.on_ping().await,
            Action::Pong => Ok(()),
            Action::Redirect => {
                let url = message.data.first().cloned().ok_or_else(|| {
                    DeepstreamError::MalformedMessage("REDIRECT without a URL".to_string())
                })?;
                self.client.on_redirect(url).await
            }
            Action::Rejection => self.client.on_rejection().await,
            Action::Error => {
                self.client.options.error_handler.on_error(message);
                Ok(())
            }
            other => Err(DeepstreamError::UnknownAction(format!(
                "CONNECTION/{}",
                other.as_token()
            ))),
        }
    }

    async fn handle_auth(&self, message: DeepstreamMessage) -> Result<()> {
        match message.action {
            Action::Ack => self.client.on_auth_ack().await,
            Action::Error => {
                self.client.options.error_handler.on_error(message);
                Ok(())
            }
            other => Err(DeepstreamError::UnknownAction(format!(
                "AUTH/{}",
                other.as_token()
            ))),
        }
    }
}
