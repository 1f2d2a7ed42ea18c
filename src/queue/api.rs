//! Public API for the queue system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Core queue and handles
pub use crate::queue::consumer::QueueConsumer;
pub use crate::queue::message_queue::MessageQueue;
pub use crate::queue::publisher::QueuePublisher;

// Message types and priorities
pub use crate::queue::message::{Message, MessageHeader, WorkMessage};
pub use crate::queue::priority::Priority;

// Filtering and discard notification
pub use crate::queue::filter::FilterPredicate;
pub use crate::queue::observer::{DiscardReason, LogObserver, QueueObserver};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Statistics
pub use crate::queue::types::QueueStats;
