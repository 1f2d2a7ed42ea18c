//! Message Types for the Priority Handoff Queue
//!
//! The queue is generic over any type implementing [`Message`]. The only
//! capability it needs is a diagnostic kind tag, used when logging discards
//! and by filter predicates that select work by kind.
//!
//! [`WorkMessage`] is a ready-made message with a header and a string payload,
//! used by the demonstration pipeline and the test suites.

use std::time::SystemTime;

/// A unit of work handed from producers to the consumer thread
///
/// Ownership moves into the queue on push and out again on pop, so
/// implementors are never required to be `Clone`.
pub trait Message: Send {
    /// Diagnostic type tag for this message
    fn kind(&self) -> &str;

    /// Called by [`QueuePublisher`](crate::queue::QueuePublisher) before the
    /// message is pushed. Messages without a sequence field ignore it.
    fn assign_sequence(&mut self, _sequence: u64) {}
}

impl<M: Message + ?Sized> Message for Box<M> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn assign_sequence(&mut self, sequence: u64) {
        (**self).assign_sequence(sequence)
    }
}

/// Header information carried by every [`WorkMessage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Per-producer sequence number, assigned by the publisher handle
    pub sequence: u64,
    /// Timestamp when the message was created
    pub timestamp: SystemTime,
    /// Identifier of the producer that created this message
    pub producer_id: String,
    /// Application-defined kind used for diagnostics and filtering
    pub kind: String,
}

/// Generic work message with a header and string payload
///
/// # Example
///
/// ```rust
/// use handoff::queue::{Message, WorkMessage};
///
/// let message = WorkMessage::new(
///     "tile-loader".to_string(),
///     "Tile".to_string(),
///     "z12/2048/1361".to_string(),
/// );
/// assert_eq!(message.kind(), "Tile");
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct WorkMessage {
    /// Message metadata
    pub header: MessageHeader,
    /// Message payload (application-specific data)
    pub data: String,
}

impl WorkMessage {
    pub fn new(producer_id: String, kind: String, data: String) -> Self {
        Self {
            header: MessageHeader {
                sequence: 0, // Set by the publisher, if any
                timestamp: SystemTime::now(),
                producer_id,
                kind,
            },
            data,
        }
    }

    /// Shorthand used heavily by tests: kind and payload only
    pub fn simple(kind: &str, data: &str) -> Self {
        Self::new("anonymous".to_string(), kind.to_string(), data.to_string())
    }

    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }

    pub fn producer_id(&self) -> &str {
        &self.header.producer_id
    }
}

impl Message for WorkMessage {
    fn kind(&self) -> &str {
        &self.header.kind
    }

    fn assign_sequence(&mut self, sequence: u64) {
        self.header.sequence = sequence;
    }
}
