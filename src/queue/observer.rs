//! Discard notifications
//!
//! The queue never reports discards to producers. Anything that wants to know
//! about them (diagnostics, counters in tests) plugs in a [`QueueObserver`].
//! Observers run after the queue lock has been released.

use crate::queue::message::Message;
use strum_macros::{Display, EnumIter};

/// Why a message was destroyed instead of delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum DiscardReason {
    /// Rejected by the installed filter, at push time or during an eviction pass
    Filtered,
    /// An `UberHighSingleton` message was already pending
    DuplicateSingleton,
    /// Dropped by an explicit clear
    Cleared,
    /// Pushed after, or still queued at, queue teardown
    Closed,
}

/// Receives every message the queue discards, just before it is dropped
pub trait QueueObserver<M>: Send + Sync {
    fn on_discarded(&self, message: &M, reason: DiscardReason);
}

/// Default observer: records discards through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl<M: Message> QueueObserver<M> for LogObserver {
    fn on_discarded(&self, message: &M, reason: DiscardReason) {
        log::debug!("Discarded {} message ({})", message.kind(), reason);
    }
}
