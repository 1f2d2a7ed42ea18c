//! Test modules for the queue system
//!
//! Suites are organised by functional area. Shared helpers live here.

mod waiting;

use crate::queue::api::{DiscardReason, MessageQueue, QueueObserver, WorkMessage};
use std::sync::{Arc, Mutex};

/// Observer that remembers every discard as `(payload, reason)`
#[derive(Default)]
pub(super) struct RecordingObserver {
    discarded: Mutex<Vec<(String, DiscardReason)>>,
}

impl RecordingObserver {
    pub(super) fn discarded(&self) -> Vec<(String, DiscardReason)> {
        self.discarded.lock().unwrap().clone()
    }
}

impl QueueObserver<WorkMessage> for RecordingObserver {
    fn on_discarded(&self, message: &WorkMessage, reason: DiscardReason) {
        self.discarded
            .lock()
            .unwrap()
            .push((message.data.clone(), reason));
    }
}

/// Queue wired to a fresh recording observer
pub(super) fn observed_queue() -> (Arc<MessageQueue<WorkMessage>>, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let queue = Arc::new(MessageQueue::with_observer(observer.clone()));
    (queue, observer)
}

/// Message whose kind and payload are both `name`
pub(super) fn msg(name: &str) -> WorkMessage {
    WorkMessage::simple(name, name)
}

/// Drain without blocking, returning payloads in delivery order
pub(super) fn drain(queue: &MessageQueue<WorkMessage>) -> Vec<String> {
    let mut delivered = Vec::new();
    while let Some(message) = queue.try_pop().unwrap() {
        delivered.push(message.data);
    }
    delivered
}
