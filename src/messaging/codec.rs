//! Wire codec for the deepstream text framing.
//!
//! A frame carries one or more messages, each terminated by the record
//! separator; within a message the topic, action, and data fields are joined
//! by the field separator. Both directions are pure transforms.

use crate::types::constants::{FIELD_SEPARATOR, MESSAGE_SEPARATOR};
use crate::types::{Action, DeepstreamError, DeepstreamMessage, Result, Topic};

/// Encode a single message into its wire representation.
pub fn encode(message: &DeepstreamMessage) -> String {
    let mut frame = String::new();
    frame.push_str(message.topic.as_token());
    frame.push(FIELD_SEPARATOR);
    frame.push_str(message.action.as_token());
    for field in &message.data {
        frame.push(FIELD_SEPARATOR);
        frame.push_str(field);
    }
    frame.push(MESSAGE_SEPARATOR);
    frame
}

/// Decode a transport frame into the messages it contains, in order.
pub fn decode(frame: &str) -> Result<Vec<DeepstreamMessage>> {
    let mut messages = Vec::new();

    for raw in frame.split(MESSAGE_SEPARATOR) {
        if raw.is_empty() {
            continue;
        }

        let mut fields = raw.split(FIELD_SEPARATOR);
        let topic_token = fields.next().unwrap_or_default();
        let action_token = fields.next().ok_or_else(|| {
            DeepstreamError::MalformedMessage(format!("missing action field in {raw:?}"))
        })?;

        let topic = Topic::from_token(topic_token)
            .ok_or_else(|| DeepstreamError::UnknownTopic(topic_token.to_string()))?;
        let action = Action::from_token(action_token)
            .ok_or_else(|| DeepstreamError::UnknownAction(action_token.to_string()))?;
        let data = fields.map(str::to_string).collect();

        messages.push(DeepstreamMessage::new(topic, action, data));
    }

    if messages.is_empty() {
        return Err(DeepstreamError::MalformedMessage(
            "frame contained no messages".to_string(),
        ));
    }

    Ok(messages)
}
