//! Queue Publisher for sending messages
//!
//! Publishers are lightweight producer-side handles. Each one carries a
//! producer id, a default priority and its own sequence counter, and holds
//! only a weak reference so that it never keeps a torn-down queue alive.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::Message;
use crate::queue::message_queue::MessageQueue;
use crate::queue::priority::Priority;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

/// Publisher handle for pushing messages into a [`MessageQueue`]
///
/// # Example
///
/// ```rust
/// # use handoff::queue::{MessageQueue, Priority, WorkMessage};
/// # use std::sync::Arc;
/// # fn example() -> handoff::queue::QueueResult<()> {
/// let queue = Arc::new(MessageQueue::new());
/// let publisher = queue.create_publisher("tile-loader".to_string(), Priority::Normal);
///
/// let message = WorkMessage::new(
///     "tile-loader".to_string(),
///     "Tile".to_string(),
///     "z12/2048/1361".to_string(),
/// );
/// let sequence = publisher.publish(message)?;
/// assert_eq!(sequence, 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct QueuePublisher<M> {
    producer_id: String,
    default_priority: Priority,
    next_sequence: AtomicU64,
    queue: Weak<MessageQueue<M>>,
}

impl<M: Message> QueuePublisher<M> {
    pub(crate) fn new(
        producer_id: String,
        default_priority: Priority,
        queue: Weak<MessageQueue<M>>,
    ) -> Self {
        Self {
            producer_id,
            default_priority,
            next_sequence: AtomicU64::new(1),
            queue,
        }
    }

    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    /// Publish at the publisher's default priority
    pub fn publish(&self, message: M) -> QueueResult<u64> {
        self.publish_with(message, self.default_priority)
    }

    /// Publish at an explicit priority, returning the assigned sequence number
    ///
    /// The sequence is consumed even if the queue then discards the message.
    pub fn publish_with(&self, mut message: M, priority: Priority) -> QueueResult<u64> {
        let queue = self.queue.upgrade().ok_or(QueueError::QueueClosed)?;

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        message.assign_sequence(sequence);
        queue.push(message, priority)?;

        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::message::WorkMessage;
    use std::sync::Arc;

    #[test]
    fn test_publisher_assigns_sequences() {
        let queue = Arc::new(MessageQueue::new());
        let publisher = queue.create_publisher("producer".to_string(), Priority::Normal);

        assert_eq!(publisher.producer_id(), "producer");
        assert_eq!(publisher.default_priority(), Priority::Normal);
        assert_eq!(publisher.publish(WorkMessage::simple("Tile", "a")).unwrap(), 1);
        assert_eq!(publisher.publish(WorkMessage::simple("Tile", "b")).unwrap(), 2);

        let first = queue.try_pop().unwrap().unwrap();
        assert_eq!(first.sequence(), 1);
        assert_eq!(first.data, "a");
    }

    #[test]
    fn test_publish_with_overrides_priority() {
        let queue = Arc::new(MessageQueue::new());
        let publisher = queue.create_publisher("producer".to_string(), Priority::Low);

        publisher.publish(WorkMessage::simple("Prefetch", "later")).unwrap();
        publisher
            .publish_with(WorkMessage::simple("Invalidate", "now"), Priority::High)
            .unwrap();

        assert_eq!(queue.try_pop().unwrap().unwrap().data, "now");
        assert_eq!(queue.try_pop().unwrap().unwrap().data, "later");
    }

    #[test]
    fn test_publish_after_queue_dropped() {
        let queue = Arc::new(MessageQueue::new());
        let publisher = queue.create_publisher("producer".to_string(), Priority::Normal);
        drop(queue);

        match publisher.publish(WorkMessage::simple("Tile", "orphan")) {
            Err(QueueError::QueueClosed) => {}
            other => panic!("Expected QueueClosed, got {:?}", other),
        }
    }
}
