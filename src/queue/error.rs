//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue lock poisoned: {message}")]
    LockPoisoned { message: String },

    #[error("Unknown message priority: {value}")]
    UnknownPriority { value: String },

    #[error("Queue has been closed")]
    QueueClosed,
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
