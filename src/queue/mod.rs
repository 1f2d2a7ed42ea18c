//! Priority Handoff Queue Component
//!
//! A thread-safe queue passing owned units of work from any number of
//! producer threads to a single consumer thread, such as a render loop.
//!
//! # Overview
//!
//! - **Priority tiers**: `UberHighSingleton` and `High` work preempts `Normal`
//!   work, and all of it preempts `Low` work
//! - **Singleton slot**: at most one `UberHighSingleton` message is pending
//! - **Blocking consumption**: the consumer can park until work arrives or
//!   the wait is cancelled explicitly
//! - **Filtering**: a predicate can evict queued work and reject new pushes
//! - **Move-only**: messages are moved in and out, never cloned
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ push               │ push               │ push
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              MessageQueue (Mutex + Condvar)             │
//! │  filter ──► reject at push / evict on install           │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │ main:  [Singleton] [High ...] [Normal ...]      │   │
//! │  └─────────────────────────────────────────────────┘   │
//! │  ┌─────────────────────────────────────────────────┐   │
//! │  │ low:   [Low ...]                                │   │
//! │  └─────────────────────────────────────────────────┘   │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ pop (main first, then low)
//!                      ┌──────┴──────┐
//!                      │  Consumer   │
//!                      └─────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use handoff::queue::{MessageQueue, Message, Priority, WorkMessage};
//! use std::sync::Arc;
//! use std::thread;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = Arc::new(MessageQueue::<WorkMessage>::new());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         let mut seen = Vec::new();
//!         while let Ok(Some(message)) = queue.pop(true) {
//!             seen.push(message.kind().to_string());
//!         }
//!         seen
//!     })
//! };
//!
//! queue.push(WorkMessage::simple("Tile", "z12"), Priority::Normal)?;
//! while !queue.is_empty()? {
//!     thread::yield_now();
//! }
//! queue.close()?;
//!
//! assert_eq!(consumer.join().unwrap(), vec!["Tile".to_string()]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod api;
mod consumer;
mod error;
mod filter;
mod message;
mod message_queue;
mod observer;
mod priority;
mod publisher;
mod storage;
mod types;

pub use consumer::QueueConsumer;
pub use error::{QueueError, QueueResult};
pub use filter::FilterPredicate;
pub use message::{Message, MessageHeader, WorkMessage};
pub use message_queue::MessageQueue;
pub use observer::{DiscardReason, LogObserver, QueueObserver};
pub use priority::Priority;
pub use publisher::QueuePublisher;
pub use types::QueueStats;

#[cfg(test)]
mod tests;
