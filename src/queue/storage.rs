//! Two-tier message storage
//!
//! The main sequence holds `Normal`, `High` and `UberHighSingleton` work in
//! drain order. `Low` work sits in a separate FIFO that is only drained once
//! the main sequence is empty. Nothing here is synchronised; the owning
//! [`MessageQueue`](crate::queue::MessageQueue) guards it with its lock.

use crate::queue::priority::Priority;
use std::collections::VecDeque;

#[derive(Debug)]
pub(crate) struct Storage<M> {
    main: VecDeque<(M, Priority)>,
    low: VecDeque<M>,
}

impl<M> Storage<M> {
    pub(crate) fn new() -> Self {
        Self {
            main: VecDeque::new(),
            low: VecDeque::new(),
        }
    }

    /// Place a message according to its priority
    ///
    /// Returns the message back as `Err` when it is a second
    /// `UberHighSingleton` while one is already pending.
    pub(crate) fn insert(&mut self, message: M, priority: Priority) -> Result<(), M> {
        match priority {
            Priority::Normal => self.main.push_back((message, priority)),
            Priority::High => {
                // Lands behind the singleton slot, ahead of every other High entry
                let position = self
                    .main
                    .iter()
                    .position(|(_, queued)| *queued <= Priority::High)
                    .unwrap_or(self.main.len());
                self.main.insert(position, (message, priority));
            }
            Priority::UberHighSingleton => {
                if self.has_singleton() {
                    return Err(message);
                }
                self.main.push_front((message, priority));
            }
            Priority::Low => self.low.push_back(message),
        }
        Ok(())
    }

    /// Remove the next message in drain order
    pub(crate) fn take_next(&mut self) -> Option<(M, Priority)> {
        self.main
            .pop_front()
            .or_else(|| self.low.pop_front().map(|message| (message, Priority::Low)))
    }

    /// Remove every message for which `discard` holds, keeping survivors in order
    pub(crate) fn evict<F>(&mut self, mut discard: F) -> Vec<M>
    where
        F: FnMut(&M) -> bool,
    {
        let mut evicted = Vec::new();

        let main = std::mem::take(&mut self.main);
        for (message, priority) in main {
            if discard(&message) {
                evicted.push(message);
            } else {
                self.main.push_back((message, priority));
            }
        }

        let low = std::mem::take(&mut self.low);
        for message in low {
            if discard(&message) {
                evicted.push(message);
            } else {
                self.low.push_back(message);
            }
        }

        evicted
    }

    /// Take every queued message, main sequence first
    pub(crate) fn drain_all(&mut self) -> Vec<M> {
        let mut drained: Vec<M> = self.main.drain(..).map(|(message, _)| message).collect();
        drained.extend(self.low.drain(..));
        drained
    }

    /// A pending singleton always sits at the front of the main sequence
    pub(crate) fn has_singleton(&self) -> bool {
        self.main
            .front()
            .is_some_and(|(_, priority)| *priority == Priority::UberHighSingleton)
    }

    pub(crate) fn len(&self) -> usize {
        self.main.len() + self.low.len()
    }

    pub(crate) fn main_len(&self) -> usize {
        self.main.len()
    }

    pub(crate) fn low_len(&self) -> usize {
        self.low.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.main.is_empty() && self.low.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn main_priorities(&self) -> Vec<Priority> {
        self.main.iter().map(|(_, priority)| *priority).collect()
    }
}
