//! Queue Consumer for the thread draining a MessageQueue
//!
//! The consumer handle wraps the pop side of the queue. Like publishers it
//! holds a weak reference, so a handle that outlives its queue reports
//! [`QueueError::QueueClosed`] rather than keeping the queue alive.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::message::Message;
use crate::queue::message_queue::MessageQueue;
use std::sync::{Arc, Weak};

/// Consumer handle for reading messages from the queue
///
/// # Example
///
/// ```rust
/// # use handoff::queue::{MessageQueue, Priority, WorkMessage};
/// # use std::sync::Arc;
/// # fn example() -> handoff::queue::QueueResult<()> {
/// let queue = Arc::new(MessageQueue::new());
/// let consumer = queue.create_consumer("render-loop".to_string());
/// queue.push(WorkMessage::simple("Tile", "a"), Priority::Normal)?;
///
/// while let Some(message) = consumer.read()? {
///     println!("Processing: {}", message.data);
/// }
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct QueueConsumer<M> {
    consumer_id: String,
    queue: Weak<MessageQueue<M>>,
}

impl<M: Message> QueueConsumer<M> {
    pub(crate) fn new(consumer_id: String, queue: Weak<MessageQueue<M>>) -> Self {
        Self { consumer_id, queue }
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    fn queue(&self) -> QueueResult<Arc<MessageQueue<M>>> {
        self.queue.upgrade().ok_or(QueueError::QueueClosed)
    }

    /// Read the next message without blocking
    pub fn read(&self) -> QueueResult<Option<M>> {
        self.queue()?.pop(false)
    }

    /// Block until a message arrives, the wait is cancelled, or the queue closes
    pub fn read_blocking(&self) -> QueueResult<Option<M>> {
        self.queue()?.pop(true)
    }

    /// Read up to `batch_size` messages without blocking
    pub fn read_batch(&self, batch_size: usize) -> QueueResult<Vec<M>> {
        let queue = self.queue()?;
        let mut batch = Vec::with_capacity(batch_size);

        for _ in 0..batch_size {
            match queue.pop(false)? {
                Some(message) => batch.push(message),
                None => break,
            }
        }

        Ok(batch)
    }

    /// Wake this consumer if it is parked in [`read_blocking`](Self::read_blocking)
    pub fn cancel(&self) -> QueueResult<()> {
        self.queue()?.cancel_wait()
    }
}
