//! Discard filter for queued and incoming messages
//!
//! At most one predicate is installed at a time. While installed it is
//! consulted on every push, and installing it also prunes whatever is
//! already queued.

use crate::queue::storage::Storage;

/// Decides whether a message should be discarded (`true`) instead of delivered
pub type FilterPredicate<M> = Box<dyn Fn(&M) -> bool + Send>;

pub(crate) struct MessageFilter<M> {
    predicate: Option<FilterPredicate<M>>,
}

impl<M> MessageFilter<M> {
    pub(crate) fn new() -> Self {
        Self { predicate: None }
    }

    pub(crate) fn install(&mut self, predicate: FilterPredicate<M>) {
        self.predicate = Some(predicate);
    }

    pub(crate) fn clear(&mut self) {
        self.predicate = None;
    }

    pub(crate) fn is_active(&self) -> bool {
        self.predicate.is_some()
    }

    /// True when the installed predicate discards `message`
    pub(crate) fn rejects(&self, message: &M) -> bool {
        self.predicate
            .as_ref()
            .is_some_and(|predicate| predicate(message))
    }

    /// Apply the installed predicate to everything already queued
    pub(crate) fn evict_from(&self, storage: &mut Storage<M>) -> Vec<M> {
        match &self.predicate {
            Some(predicate) => storage.evict(|message| predicate(message)),
            None => Vec::new(),
        }
    }
}

impl<M> std::fmt::Debug for MessageFilter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFilter")
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
