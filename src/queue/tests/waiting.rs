//! Blocking consumption, cancellation and concurrent producers

#[cfg(test)]
mod tests {
    use super::super::msg;
    use crate::queue::api::{MessageQueue, Priority, QueueError, WorkMessage};
    use crate::queue::message::Message;
    use std::collections::HashMap;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    const PROMPT: Duration = Duration::from_secs(5);

    /// Spin until a consumer is parked inside pop
    fn wait_until_parked(queue: &MessageQueue<WorkMessage>) {
        let deadline = Instant::now() + PROMPT;
        while !queue.is_waiting().unwrap() {
            assert!(Instant::now() < deadline, "consumer never started waiting");
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Start a consumer blocked in pop(true); its result arrives on the receiver
    fn spawn_blocked_consumer(
        queue: &Arc<MessageQueue<WorkMessage>>,
    ) -> (thread::JoinHandle<()>, mpsc::Receiver<Option<String>>) {
        let (tx, rx) = mpsc::channel();
        let queue = Arc::clone(queue);
        let handle = thread::spawn(move || {
            let result = queue.pop(true).unwrap().map(|message| message.data);
            let _ = tx.send(result);
        });
        (handle, rx)
    }

    #[test]
    fn test_cancel_wakes_blocked_consumer_without_message() {
        let queue = Arc::new(MessageQueue::new());
        let (handle, rx) = spawn_blocked_consumer(&queue);
        wait_until_parked(&queue);

        queue.cancel_wait().unwrap();

        let result = rx.recv_timeout(PROMPT).expect("consumer did not wake");
        assert_eq!(result, None);
        handle.join().unwrap();

        let stats = queue.stats().unwrap();
        assert_eq!(stats.cancelled_waits, 1);
        assert!(!stats.waiting);
    }

    #[test]
    fn test_push_wakes_blocked_consumer_with_message() {
        let queue = Arc::new(MessageQueue::new());
        let (handle, rx) = spawn_blocked_consumer(&queue);
        wait_until_parked(&queue);

        queue.push(msg("Tile"), Priority::Low).unwrap();

        let result = rx.recv_timeout(PROMPT).expect("consumer did not wake");
        assert_eq!(result, Some("Tile".to_string()));
        handle.join().unwrap();
        assert!(!queue.is_waiting().unwrap());
    }

    #[test]
    fn test_filtered_push_does_not_wake_consumer() {
        let queue = Arc::new(MessageQueue::new());
        queue
            .enable_filtering(|message: &WorkMessage| message.data == "Foo")
            .unwrap();
        let (handle, rx) = spawn_blocked_consumer(&queue);
        wait_until_parked(&queue);

        queue.push(msg("Foo"), Priority::Normal).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(queue.is_waiting().unwrap());

        queue.push(msg("Bar"), Priority::Normal).unwrap();
        assert_eq!(
            rx.recv_timeout(PROMPT).expect("consumer did not wake"),
            Some("Bar".to_string())
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_before_wait_does_not_release_later_wait() {
        let queue = Arc::new(MessageQueue::new());
        queue.cancel_wait().unwrap();

        let (handle, rx) = spawn_blocked_consumer(&queue);
        wait_until_parked(&queue);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        queue.push(msg("Resize"), Priority::High).unwrap();
        assert_eq!(
            rx.recv_timeout(PROMPT).expect("consumer did not wake"),
            Some("Resize".to_string())
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_clear_wakes_blocked_consumer() {
        let queue = Arc::new(MessageQueue::new());
        let (handle, rx) = spawn_blocked_consumer(&queue);
        wait_until_parked(&queue);

        assert_eq!(queue.clear().unwrap(), 0);

        assert_eq!(rx.recv_timeout(PROMPT).expect("consumer did not wake"), None);
        handle.join().unwrap();
    }

    #[test]
    fn test_close_releases_consumer_after_lock_poisoned() {
        let queue = Arc::new(MessageQueue::new());
        queue
            .enable_filtering(|message: &WorkMessage| message.kind() == "Foo")
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let handle = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let _ = tx.send(queue.pop(true));
            })
        };
        wait_until_parked(&queue);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = queue.instant_filter(|message: &WorkMessage| message.kind() == "Bar");
        }));
        assert!(outcome.is_err());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        assert!(matches!(queue.close(), Err(QueueError::LockPoisoned { .. })));

        let result = rx.recv_timeout(PROMPT).expect("consumer did not wake");
        assert!(matches!(result, Err(QueueError::LockPoisoned { .. })));
        handle.join().unwrap();
    }

    #[test]
    fn test_concurrent_producers_single_consumer() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: u64 = 250;

        let queue = Arc::new(MessageQueue::<WorkMessage>::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received: HashMap<String, Vec<u64>> = HashMap::new();
                let expected = PRODUCERS * PER_PRODUCER as usize;
                let mut total = 0;
                while total < expected {
                    if let Some(message) = queue.pop(true).unwrap() {
                        received
                            .entry(message.producer_id().to_string())
                            .or_default()
                            .push(message.sequence());
                        total += 1;
                    }
                }
                received
            })
        };

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|index| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let publisher =
                        queue.create_publisher(format!("producer-{}", index), Priority::Normal);
                    for i in 0..PER_PRODUCER {
                        let message = WorkMessage::new(
                            publisher.producer_id().to_string(),
                            "Tile".to_string(),
                            i.to_string(),
                        );
                        publisher.publish(message).unwrap();
                    }
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        let received = consumer.join().unwrap();

        assert_eq!(received.len(), PRODUCERS);
        for sequences in received.values() {
            // Normal tier is FIFO, so each producer's work arrives in order
            let expected: Vec<u64> = (1..=PER_PRODUCER).collect();
            assert_eq!(sequences, &expected);
        }
        assert_eq!(queue.stats().unwrap().popped, PRODUCERS as u64 * PER_PRODUCER);
    }
}
