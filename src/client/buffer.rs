use std::collections::VecDeque;
use std::time::Duration;

use crate::types::DeepstreamMessage;

/// FIFO queue of messages that could not be sent because authentication was
/// still pending. Each entry carries the configured time-to-live; expired
/// entries are dropped silently with a debug-level log only.
///
/// Lives inside `ClientState`, so offers and drains are serialized by the
/// state lock and a drain is atomic relative to concurrent offers.
pub struct OutgoingBuffer {
    entries: VecDeque<DeepstreamMessage>,
    ttl: Duration,
}

impl OutgoingBuffer {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: VecDeque::new(),
            ttl,
        }
    }

    /// Append a message unless it has already expired. Returns whether the
    /// message was accepted.
    pub fn offer(&mut self, message: DeepstreamMessage) -> bool {
        if message.expired(self.ttl) {
            tracing::debug!(
                "dropping expired outgoing message {} {}",
                message.topic.as_token(),
                message.action.as_token()
            );
            return false;
        }
        self.entries.push_back(message);
        true
    }

    /// Remove and return all non-expired messages in FIFO order, clearing the
    /// buffer.
    pub fn drain(&mut self) -> Vec<DeepstreamMessage> {
        let ttl = self.ttl;
        self.entries
            .drain(..)
            .filter(|message| {
                if message.expired(ttl) {
                    tracing::debug!(
                        "discarding expired buffered message {} {}",
                        message.topic.as_token(),
                        message.action.as_token()
                    );
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Topic};

    fn event(name: &str) -> DeepstreamMessage {
        DeepstreamMessage::new(Topic::Event, Action::Event, vec![name.to_string()])
    }

    #[test]
    fn test_drain_preserves_fifo_order_and_clears() {
        let mut buffer = OutgoingBuffer::new(Duration::from_secs(60));
        assert!(buffer.offer(event("first")));
        assert!(buffer.offer(event("second")));
        assert!(buffer.offer(event("third")));

        let drained = buffer.drain();
        let names: Vec<&str> = drained.iter().map(|m| m.data[0].as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_already_expired_message_is_rejected_at_offer() {
        let mut buffer = OutgoingBuffer::new(Duration::ZERO);
        let message = event("stale");
        std::thread::sleep(Duration::from_millis(5));

        assert!(!buffer.offer(message));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_message_expiring_while_buffered_is_not_drained() {
        let mut buffer = OutgoingBuffer::new(Duration::from_millis(10));
        assert!(buffer.offer(event("doomed")));
        assert_eq!(buffer.len(), 1);

        std::thread::sleep(Duration::from_millis(25));
        assert!(buffer.drain().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_expired_entries_are_skipped_but_live_ones_kept() {
        let mut buffer = OutgoingBuffer::new(Duration::from_millis(30));
        assert!(buffer.offer(event("old")));
        std::thread::sleep(Duration::from_millis(40));
        assert!(buffer.offer(event("fresh")));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].data[0], "fresh");
    }
}
