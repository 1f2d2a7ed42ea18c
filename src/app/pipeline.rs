//! Demonstration pipeline: producer threads feeding a render loop
//!
//! ```text
//! producer-0 ─┐
//! producer-1 ─┼─► MessageQueue ──► render-loop
//! producer-N ─┘   (filters)        (blocking pop)
//! ```
//!
//! Producers publish `WorkMessage`s cycling over the configured kinds, each
//! at its kind's priority. The render loop blocks in a pop and tallies what
//! it receives. Once producers finish and the queue drains, or shutdown is
//! requested, the pipeline cancels the pending wait and closes the queue. A
//! failed producer takes the same teardown path before its error is returned.

use crate::app::cli::{KindSpec, Settings};
use crate::core::error_handling::ContextualError;
use crate::queue::{Message, MessageQueue, Priority, QueueError, QueueStats, WorkMessage};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

const RENDER_LOOP_ID: &str = "render-loop";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Failed to spawn thread '{name}': {message}")]
    ThreadSpawn { name: String, message: String },

    #[error("Thread '{name}' panicked")]
    ThreadPanicked { name: String },
}

impl ContextualError for PipelineError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Messages handed to the queue by all producers
    pub published: u64,
    /// Messages the render loop received, per kind
    pub delivered: BTreeMap<String, u64>,
    /// Queue snapshot taken after teardown
    pub stats: QueueStats,
    /// Whether shutdown was requested before producers finished
    pub interrupted: bool,
}

impl PipelineReport {
    pub fn delivered_total(&self) -> u64 {
        self.delivered.values().sum()
    }

    pub fn log(&self) {
        log::info!(
            "Pipeline {}: published {}, delivered {}, discarded {}",
            if self.interrupted { "interrupted" } else { "finished" },
            self.published,
            self.delivered_total(),
            self.stats.discarded()
        );
        for (kind, count) in &self.delivered {
            log::info!("  {:<12} {:>6}", kind, count);
        }
        log::info!(
            "Queue: pushed {}, popped {}, filtered {}, duplicate singletons {}, cleared {}, cancelled waits {}",
            self.stats.pushed,
            self.stats.popped,
            self.stats.filtered,
            self.stats.duplicate_singletons,
            self.stats.cleared,
            self.stats.cancelled_waits
        );
    }
}

/// Producers, render loop and the queue between them
pub struct Pipeline {
    settings: Settings,
    queue: Arc<MessageQueue<WorkMessage>>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            queue: Arc::new(MessageQueue::new()),
        }
    }

    pub fn queue(&self) -> &Arc<MessageQueue<WorkMessage>> {
        &self.queue
    }

    /// Release the render loop and tear the queue down
    ///
    /// Safe to call from any thread and more than once. The queue is closed
    /// even when the cancel fails.
    pub fn stop(&self) -> Result<(), PipelineError> {
        let cancelled = self.queue.cancel_wait();
        self.queue.close()?;
        cancelled?;
        Ok(())
    }

    /// Run to completion, or until `shutdown` is raised
    pub fn run(&self, shutdown: Arc<AtomicBool>) -> Result<PipelineReport, PipelineError> {
        if !self.settings.drop_kinds.is_empty() {
            let drop_kinds = self.settings.drop_kinds.clone();
            let evicted = self
                .queue
                .enable_filtering(move |message: &WorkMessage| {
                    drop_kinds.iter().any(|kind| kind == message.kind())
                })?;
            log::info!(
                "Dropping kinds [{}] ({} already queued)",
                self.settings.drop_kinds.join(", "),
                evicted
            );
        }

        let (drained_tx, drained_rx) = mpsc::sync_channel(1);
        let render_loop = self.spawn_render_loop(Arc::clone(&shutdown), drained_tx)?;

        // From here on the render loop is released and joined on every path
        let fed = self.feed(&shutdown, &drained_rx);
        let stopped = self.stop();
        let rendered = join_thread(render_loop, RENDER_LOOP_ID);

        let (published, interrupted) = fed?;
        stopped?;
        let delivered = rendered??;

        Ok(PipelineReport {
            published,
            delivered,
            stats: self.queue.stats()?,
            interrupted,
        })
    }

    /// Run the producers, purge, then wait for the render loop to drain the queue
    ///
    /// Returns the number of messages published and whether shutdown was
    /// requested while producing.
    fn feed(
        &self,
        shutdown: &Arc<AtomicBool>,
        drained: &Receiver<()>,
    ) -> Result<(u64, bool), PipelineError> {
        let mut failure = None;
        let mut producers = Vec::with_capacity(self.settings.producers);
        for index in 0..self.settings.producers {
            match self.spawn_producer(index, Arc::clone(shutdown)) {
                Ok(producer) => producers.push(producer),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if failure.is_some() {
            // Producers already running finish fast against a closed queue
            self.queue.close()?;
        }

        let mut published = 0;
        for (index, producer) in producers.into_iter().enumerate() {
            match join_thread(producer, &format!("producer-{}", index)) {
                Ok(Ok(count)) => published += count,
                Ok(Err(e)) => {
                    failure.get_or_insert(PipelineError::from(e));
                }
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let interrupted = shutdown.load(Ordering::Acquire);
        log::debug!("Producers finished, {} message(s) published", published);

        if !interrupted && !self.settings.purge_kinds.is_empty() {
            self.purge()?;
        }

        // Nothing is pushed any more, so only the render loop empties the
        // queue now. It signals each time it does, and hangs up on exit.
        while !shutdown.load(Ordering::Acquire) && !self.queue.is_empty()? {
            if drained.recv().is_err() {
                break;
            }
        }

        Ok((published, interrupted))
    }

    /// One-shot removal of purge kinds from whatever is still queued
    fn purge(&self) -> Result<(), PipelineError> {
        // A standing filter would trip the one-shot filter's precondition
        if self.queue.is_filtering()? {
            self.queue.disable_filtering()?;
        }
        let purge_kinds = self.settings.purge_kinds.clone();
        let purged = self.queue.instant_filter(move |message: &WorkMessage| {
            purge_kinds.iter().any(|kind| kind == message.kind())
        })?;
        log::info!(
            "Purged {} queued message(s) of kinds [{}]",
            purged,
            self.settings.purge_kinds.join(", ")
        );
        Ok(())
    }

    fn spawn_render_loop(
        &self,
        shutdown: Arc<AtomicBool>,
        drained: SyncSender<()>,
    ) -> Result<JoinHandle<Result<BTreeMap<String, u64>, QueueError>>, PipelineError> {
        let queue = Arc::clone(&self.queue);
        let consumer = queue.create_consumer(RENDER_LOOP_ID.to_string());

        spawn_named(RENDER_LOOP_ID.to_string(), move || -> Result<_, QueueError> {
            let mut delivered: BTreeMap<String, u64> = BTreeMap::new();
            loop {
                match consumer.read_blocking()? {
                    Some(message) => {
                        log::trace!(
                            "{} rendering {} from {} (#{})",
                            consumer.consumer_id(),
                            message.kind(),
                            message.producer_id(),
                            message.sequence()
                        );
                        *delivered.entry(message.kind().to_string()).or_insert(0) += 1;
                        if queue.is_empty()? {
                            // Full means an earlier report is still unread
                            let _ = drained.try_send(());
                        }
                    }
                    // Woken with nothing to do
                    None if queue.is_closed()? || shutdown.load(Ordering::Acquire) => break,
                    None => continue,
                }
            }
            Ok(delivered)
        })
    }

    fn spawn_producer(
        &self,
        index: usize,
        shutdown: Arc<AtomicBool>,
    ) -> Result<JoinHandle<Result<u64, QueueError>>, PipelineError> {
        let producer_id = format!("producer-{}", index);
        let publisher = self
            .queue
            .create_publisher(producer_id.clone(), Priority::Normal);
        let kinds: Vec<KindSpec> = self.settings.kinds.clone();
        let messages = self.settings.messages;
        let pace = self.settings.pace;

        spawn_named(producer_id.clone(), move || -> Result<u64, QueueError> {
            let mut published = 0;
            // Offset the cycle so producers do not publish in lockstep
            for (n, kind) in kinds.iter().cycle().skip(index).take(messages).enumerate() {
                if shutdown.load(Ordering::Acquire) {
                    log::debug!("{} stopping early after {} message(s)", producer_id, n);
                    break;
                }
                let message = WorkMessage::new(
                    producer_id.clone(),
                    kind.name.clone(),
                    format!("{}:{}", producer_id, n),
                );
                publisher.publish_with(message, kind.priority)?;
                published += 1;

                if !pace.is_zero() {
                    thread::sleep(pace);
                }
            }
            Ok(published)
        })
    }
}

fn spawn_named<T, F>(name: String, body: F) -> Result<JoinHandle<T>, PipelineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .map_err(|e| PipelineError::ThreadSpawn {
            name,
            message: e.to_string(),
        })
}

fn join_thread<T>(handle: JoinHandle<T>, name: &str) -> Result<T, PipelineError> {
    handle.join().map_err(|_| PipelineError::ThreadPanicked {
        name: name.to_string(),
    })
}
