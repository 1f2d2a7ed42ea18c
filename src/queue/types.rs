//! Type definitions for the queue system

/// Point-in-time snapshot of a queue, taken under its lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages currently queued in both tiers
    pub queued: usize,
    /// Messages in the main (Normal and above) sequence
    pub main_queued: usize,
    /// Messages in the low-priority FIFO
    pub low_queued: usize,
    /// Messages accepted by push
    pub pushed: u64,
    /// Messages handed out by pop
    pub popped: u64,
    /// Messages discarded by a filter, at push time or by eviction
    pub filtered: u64,
    /// Singleton pushes discarded because one was already pending
    pub duplicate_singletons: u64,
    /// Messages discarded by clear or teardown
    pub cleared: u64,
    /// Cancel requests that actually woke a waiting consumer
    pub cancelled_waits: u64,
    /// Whether a standing filter is installed
    pub filtering: bool,
    /// Whether a consumer is parked in pop
    pub waiting: bool,
    /// Whether the queue has been torn down
    pub closed: bool,
}

impl QueueStats {
    /// Total messages that never reached a consumer
    pub fn discarded(&self) -> u64 {
        self.filtered + self.duplicate_singletons + self.cleared
    }
}
