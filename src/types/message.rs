use std::time::{Duration, Instant};

use crate::types::constants::{actions, topics};

/// Top-level message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Auth,
    Connection,
    Event,
    Error,
    Record,
    Rpc,
}

impl Topic {
    /// Parse a wire token into a Topic
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            topics::AUTH => Some(Self::Auth),
            topics::CONNECTION => Some(Self::Connection),
            topics::EVENT => Some(Self::Event),
            topics::ERROR => Some(Self::Error),
            topics::RECORD => Some(Self::Record),
            topics::RPC => Some(Self::Rpc),
            _ => None,
        }
    }

    /// Convert to the wire token
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Auth => topics::AUTH,
            Self::Connection => topics::CONNECTION,
            Self::Event => topics::EVENT,
            Self::Error => topics::ERROR,
            Self::Record => topics::RECORD,
            Self::Rpc => topics::RPC,
        }
    }
}

/// Topic-scoped verb describing a message's intent.
///
/// The handshake and liveness actions (ACK through REQUEST) are handled by the
/// connection engine itself; the remaining actions belong to the event and
/// record handlers and are forwarded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Ack,
    Challenge,
    ChallengeResponse,
    Error,
    Ping,
    Pong,
    Redirect,
    Rejection,
    Request,
    Subscribe,
    Unsubscribe,
    Event,
    CreateOrRead,
    Read,
    Update,
    Patch,
    Delete,
}

impl Action {
    /// Parse a wire token into an Action
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            actions::ACK => Some(Self::Ack),
            actions::CHALLENGE => Some(Self::Challenge),
            actions::CHALLENGE_RESPONSE => Some(Self::ChallengeResponse),
            actions::ERROR => Some(Self::Error),
            actions::PING => Some(Self::Ping),
            actions::PONG => Some(Self::Pong),
            actions::REDIRECT => Some(Self::Redirect),
            actions::REJECTION => Some(Self::Rejection),
            actions::REQUEST => Some(Self::Request),
            actions::SUBSCRIBE => Some(Self::Subscribe),
            actions::UNSUBSCRIBE => Some(Self::Unsubscribe),
            actions::EVENT => Some(Self::Event),
            actions::CREATE_OR_READ => Some(Self::CreateOrRead),
            actions::READ => Some(Self::Read),
            actions::UPDATE => Some(Self::Update),
            actions::PATCH => Some(Self::Patch),
            actions::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    /// Convert to the wire token
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Ack => actions::ACK,
            Self::Challenge => actions::CHALLENGE,
            Self::ChallengeResponse => actions::CHALLENGE_RESPONSE,
            Self::Error => actions::ERROR,
            Self::Ping => actions::PING,
            Self::Pong => actions::PONG,
            Self::Redirect => actions::REDIRECT,
            Self::Rejection => actions::REJECTION,
            Self::Request => actions::REQUEST,
            Self::Subscribe => actions::SUBSCRIBE,
            Self::Unsubscribe => actions::UNSUBSCRIBE,
            Self::Event => actions::EVENT,
            Self::CreateOrRead => actions::CREATE_OR_READ,
            Self::Read => actions::READ,
            Self::Update => actions::UPDATE,
            Self::Patch => actions::PATCH,
            Self::Delete => actions::DELETE,
        }
    }
}

/// A single wire message: topic, action, and ordered raw payload fields.
#[derive(Debug, Clone)]
pub struct DeepstreamMessage {
    pub topic: Topic,
    pub action: Action,
    pub data: Vec<String>,
    created_at: Instant,
}

impl DeepstreamMessage {
    pub fn new(topic: Topic, action: Action, data: Vec<String>) -> Self {
        Self {
            topic,
            action,
            data,
            created_at: Instant::now(),
        }
    }

    /// True unless the message is part of the connection/authentication
    /// handshake. Messages that need authentication are buffered while the
    /// client is not logged in.
    pub fn needs_authentication(&self) -> bool {
        !matches!(self.topic, Topic::Connection | Topic::Auth)
    }

    /// True once `ttl` has elapsed since the message was created.
    pub fn expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_messages_skip_authentication() {
        let challenge = DeepstreamMessage::new(Topic::Connection, Action::Challenge, vec![]);
        let auth = DeepstreamMessage::new(Topic::Auth, Action::Request, vec!["{}".to_string()]);
        assert!(!challenge.needs_authentication());
        assert!(!auth.needs_authentication());
    }

    #[test]
    fn test_application_messages_need_authentication() {
        let event = DeepstreamMessage::new(Topic::Event, Action::Subscribe, vec!["news".into()]);
        let record = DeepstreamMessage::new(Topic::Record, Action::Read, vec!["user/1".into()]);
        assert!(event.needs_authentication());
        assert!(record.needs_authentication());
    }

    #[test]
    fn test_message_expiry() {
        let message = DeepstreamMessage::new(Topic::Event, Action::Event, vec![]);
        assert!(!message.expired(Duration::from_secs(60)));

        std::thread::sleep(Duration::from_millis(5));
        assert!(message.expired(Duration::ZERO));
    }

    #[test]
    fn test_topic_token_round_trip() {
        for topic in [
            Topic::Auth,
            Topic::Connection,
            Topic::Event,
            Topic::Error,
            Topic::Record,
            Topic::Rpc,
        ] {
            assert_eq!(Topic::from_token(topic.as_token()), Some(topic));
        }
        assert_eq!(Topic::from_token("Z"), None);
    }

    #[test]
    fn test_action_token_round_trip() {
        for action in [
            Action::Ack,
            Action::Challenge,
            Action::ChallengeResponse,
            Action::Ping,
            Action::Pong,
            Action::Redirect,
            Action::Rejection,
            Action::Request,
            Action::Subscribe,
            Action::Event,
            Action::Update,
        ] {
            assert_eq!(Action::from_token(action.as_token()), Some(action));
        }
        assert_eq!(Action::from_token("NOPE"), None);
    }
}
