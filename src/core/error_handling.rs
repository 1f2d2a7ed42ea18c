//! Generic error handling utilities
//!
//! Provides unified error reporting that works across the crate's error
//! types while keeping user-facing messages short.

use crate::queue::QueueError;

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on
    /// directly (bad configuration, unknown priority names)
    fn is_user_actionable(&self) -> bool;

    /// The specific user message for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// User-actionable errors show their own message; system errors show the
/// operation context. Full detail is always available at debug level.
///
/// # Examples
/// ```rust,no_run
/// # use handoff::core::error_handling::log_error_with_context;
/// # use handoff::queue::QueueError;
/// let error = QueueError::LockPoisoned { message: "panic in filter".to_string() };
/// log_error_with_context(&error, "Draining render queue");
/// // Logs: "FATAL: Draining render queue", details at debug level
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

// Queue failures at runtime are internal; priority names are validated
// earlier, at the configuration boundary, where they become ValidationError.
impl ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
