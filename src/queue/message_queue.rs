//! MessageQueue: the priority handoff monitor
//!
//! One mutex guards all shared state: both storage tiers, the installed
//! filter, the explicit `waiting` flag and the counters. One condition
//! variable parks the consumer while the queue is empty.
//!
//! Waiting is modelled as state rather than inferred from the condvar. A
//! blocking pop sets `waiting` and sleeps until something clears it: a
//! successful push, [`MessageQueue::cancel_wait`], a clear, or teardown.
//! A cancel issued while nobody waits is a no-op.

use crate::core::sync::handle_mutex_poison;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::filter::MessageFilter;
use crate::queue::message::Message;
use crate::queue::observer::{DiscardReason, LogObserver, QueueObserver};
use crate::queue::priority::Priority;
use crate::queue::storage::Storage;
use crate::queue::types::QueueStats;
use crate::queue::{QueueConsumer, QueuePublisher};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    pushed: u64,
    popped: u64,
    filtered: u64,
    duplicate_singletons: u64,
    cleared: u64,
    cancelled_waits: u64,
}

#[derive(Debug)]
struct QueueState<M> {
    storage: Storage<M>,
    filter: MessageFilter<M>,
    waiting: bool,
    closed: bool,
    counters: Counters,
}

impl<M> QueueState<M> {
    /// Leave the `Waiting` state; true if a waiter has to be notified
    fn release_waiter(&mut self) -> bool {
        std::mem::replace(&mut self.waiting, false)
    }

    /// Run the installed filter over everything queued
    fn evict_filtered(&mut self) -> Vec<M> {
        let evicted = self.filter.evict_from(&mut self.storage);
        self.counters.filtered += evicted.len() as u64;
        evicted
    }
}

/// Thread-safe priority queue handing work from producers to one consumer
///
/// # Example
///
/// ```rust
/// use handoff::queue::{MessageQueue, Priority, WorkMessage};
///
/// # fn example() -> handoff::queue::QueueResult<()> {
/// let queue = MessageQueue::new();
/// queue.push(WorkMessage::simple("Tile", "a"), Priority::Normal)?;
/// queue.push(WorkMessage::simple("Invalidate", "b"), Priority::High)?;
///
/// let first = queue.pop(false)?.unwrap();
/// assert_eq!(first.data, "b");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct MessageQueue<M> {
    state: Mutex<QueueState<M>>,
    wakeup: Condvar,
    observer: Arc<dyn QueueObserver<M>>,
}

impl<M: Message> Default for MessageQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> MessageQueue<M> {
    /// Create a queue that logs discarded messages at debug level
    pub fn new() -> Self {
        Self::with_observer(Arc::new(LogObserver))
    }

    /// Create a queue reporting discards to a custom observer
    pub fn with_observer(observer: Arc<dyn QueueObserver<M>>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                storage: Storage::new(),
                filter: MessageFilter::new(),
                waiting: false,
                closed: false,
                counters: Counters::default(),
            }),
            wakeup: Condvar::new(),
            observer,
        }
    }

    fn lock_state(&self) -> QueueResult<MutexGuard<'_, QueueState<M>>> {
        handle_mutex_poison(self.state.lock(), |message| QueueError::LockPoisoned {
            message,
        })
    }

    fn notify_discarded(&self, discarded: Vec<M>, reason: DiscardReason) {
        for message in discarded {
            self.observer.on_discarded(&message, reason);
        }
    }

    /// Queue a message at the given priority
    ///
    /// The message is silently discarded when the installed filter rejects
    /// it, when it is a second `UberHighSingleton` while one is pending, or
    /// when the queue has been closed. Any accepted message wakes a parked
    /// consumer.
    pub fn push(&self, message: M, priority: Priority) -> QueueResult<()> {
        let rejected = {
            let mut state = self.lock_state()?;

            if state.closed {
                state.counters.cleared += 1;
                Some((message, DiscardReason::Closed))
            } else if state.filter.rejects(&message) {
                state.counters.filtered += 1;
                Some((message, DiscardReason::Filtered))
            } else {
                log::trace!("Queueing {} message at {}", message.kind(), priority);
                match state.storage.insert(message, priority) {
                    Ok(()) => {
                        state.counters.pushed += 1;
                        if state.release_waiter() {
                            self.wakeup.notify_all();
                        }
                        None
                    }
                    Err(duplicate) => {
                        state.counters.duplicate_singletons += 1;
                        Some((duplicate, DiscardReason::DuplicateSingleton))
                    }
                }
            }
        };

        if let Some((message, reason)) = rejected {
            self.observer.on_discarded(&message, reason);
        }
        Ok(())
    }

    /// Take the next message, optionally blocking while the queue is empty
    ///
    /// `Ok(None)` is a normal outcome: the queue was empty on a
    /// non-blocking call, the wait was cancelled with nothing to deliver,
    /// or the queue has been closed.
    pub fn pop(&self, wait: bool) -> QueueResult<Option<M>> {
        let mut state = self.lock_state()?;

        if wait && state.storage.is_empty() && !state.closed {
            state.waiting = true;
            state = handle_mutex_poison(
                self.wakeup.wait_while(state, |state| state.waiting),
                |message| QueueError::LockPoisoned { message },
            )?;
            state.waiting = false;
        }

        match state.storage.take_next() {
            Some((message, priority)) => {
                state.counters.popped += 1;
                log::trace!("Popped {} message at {}", message.kind(), priority);
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Non-blocking pop
    pub fn try_pop(&self) -> QueueResult<Option<M>> {
        self.pop(false)
    }

    /// Blocking pop; still returns `Ok(None)` after a cancel or close
    pub fn pop_blocking(&self) -> QueueResult<Option<M>> {
        self.pop(true)
    }

    /// Wake a consumer parked in [`pop`](Self::pop); no-op when nobody waits
    pub fn cancel_wait(&self) -> QueueResult<()> {
        let mut state = self.lock_state()?;
        if state.release_waiter() {
            state.counters.cancelled_waits += 1;
            log::debug!("Cancelled pending wait");
            self.wakeup.notify_all();
        }
        Ok(())
    }

    /// Install a standing filter and evict queued messages it rejects
    ///
    /// Replaces any filter already installed. Returns the number of
    /// messages evicted from the queue.
    pub fn enable_filtering<F>(&self, predicate: F) -> QueueResult<usize>
    where
        F: Fn(&M) -> bool + Send + 'static,
    {
        let evicted = {
            let mut state = self.lock_state()?;
            state.filter.install(Box::new(predicate));
            state.evict_filtered()
        };

        let count = evicted.len();
        log::debug!("Filtering enabled, evicted {} queued message(s)", count);
        self.notify_discarded(evicted, DiscardReason::Filtered);
        Ok(count)
    }

    /// Remove the standing filter; already discarded messages stay gone
    pub fn disable_filtering(&self) -> QueueResult<()> {
        let mut state = self.lock_state()?;
        if state.filter.is_active() {
            log::debug!("Filtering disabled");
        }
        state.filter.clear();
        Ok(())
    }

    /// Evict queued messages matching `predicate` once, without leaving a filter behind
    ///
    /// # Panics
    ///
    /// Panics when a standing filter is installed. The panic happens while
    /// the queue lock is held, poisoning it, so every later operation on
    /// this queue fails with [`QueueError::LockPoisoned`].
    pub fn instant_filter<F>(&self, predicate: F) -> QueueResult<usize>
    where
        F: Fn(&M) -> bool + Send + 'static,
    {
        let evicted = {
            let mut state = self.lock_state()?;
            assert!(
                !state.filter.is_active(),
                "instant_filter called while a standing filter is installed"
            );
            state.filter.install(Box::new(predicate));
            let evicted = state.evict_filtered();
            state.filter.clear();
            evicted
        };

        let count = evicted.len();
        log::debug!("Instant filter evicted {} queued message(s)", count);
        self.notify_discarded(evicted, DiscardReason::Filtered);
        Ok(count)
    }

    /// Discard every queued message and wake any parked consumer
    pub fn clear(&self) -> QueueResult<usize> {
        let drained = {
            let mut state = self.lock_state()?;
            if state.release_waiter() {
                self.wakeup.notify_all();
            }
            let drained = state.storage.drain_all();
            state.counters.cleared += drained.len() as u64;
            drained
        };

        let count = drained.len();
        self.notify_discarded(drained, DiscardReason::Cleared);
        Ok(count)
    }

    /// Tear the queue down
    ///
    /// Wakes any parked consumer first, then discards all queued content.
    /// Afterwards pops return `Ok(None)` without blocking and pushes are
    /// discarded. Calling it again is harmless. On a poisoned queue it still
    /// releases parked consumers before returning `LockPoisoned`.
    pub fn close(&self) -> QueueResult<()> {
        let drained = {
            let mut state = match self.lock_state() {
                Ok(state) => state,
                Err(error) => {
                    self.release_after_poison();
                    return Err(error);
                }
            };
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.release_waiter();
            self.wakeup.notify_all();

            let drained = state.storage.drain_all();
            state.counters.cleared += drained.len() as u64;
            drained
        };

        log::debug!("Queue closed, discarded {} message(s)", drained.len());
        self.notify_discarded(drained, DiscardReason::Closed);
        Ok(())
    }

    /// Let parked consumers go once a panic has poisoned the lock
    ///
    /// Queued content is left alone. Woken consumers see `LockPoisoned`.
    fn release_after_poison(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state.waiting = false;
        self.wakeup.notify_all();
    }

    /// Number of queued messages across both tiers
    pub fn size(&self) -> QueueResult<usize> {
        Ok(self.lock_state()?.storage.len())
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.lock_state()?.storage.is_empty())
    }

    /// True while a consumer is parked inside a blocking pop
    pub fn is_waiting(&self) -> QueueResult<bool> {
        Ok(self.lock_state()?.waiting)
    }

    pub fn is_filtering(&self) -> QueueResult<bool> {
        Ok(self.lock_state()?.filter.is_active())
    }

    pub fn is_closed(&self) -> QueueResult<bool> {
        Ok(self.lock_state()?.closed)
    }

    /// Consistent snapshot of queue contents and counters
    pub fn stats(&self) -> QueueResult<QueueStats> {
        let state = self.lock_state()?;
        Ok(QueueStats {
            queued: state.storage.len(),
            main_queued: state.storage.main_len(),
            low_queued: state.storage.low_len(),
            pushed: state.counters.pushed,
            popped: state.counters.popped,
            filtered: state.counters.filtered,
            duplicate_singletons: state.counters.duplicate_singletons,
            cleared: state.counters.cleared,
            cancelled_waits: state.counters.cancelled_waits,
            filtering: state.filter.is_active(),
            waiting: state.waiting,
            closed: state.closed,
        })
    }

    /// Create a publisher handle pushing at `default_priority`
    pub fn create_publisher(
        self: &Arc<Self>,
        producer_id: String,
        default_priority: Priority,
    ) -> QueuePublisher<M> {
        QueuePublisher::new(producer_id, default_priority, Arc::downgrade(self))
    }

    /// Create a consumer handle for the thread draining this queue
    pub fn create_consumer(self: &Arc<Self>, consumer_id: String) -> QueueConsumer<M> {
        QueueConsumer::new(consumer_id, Arc::downgrade(self))
    }
}

impl<M> Drop for MessageQueue<M> {
    fn drop(&mut self) {
        // Exclusive access: no consumer can still be parked here
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for message in state.storage.drain_all() {
            self.observer.on_discarded(&message, DiscardReason::Closed);
        }
    }
}

impl<M> std::fmt::Debug for MessageQueue<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue").finish_non_exhaustive()
    }
}
