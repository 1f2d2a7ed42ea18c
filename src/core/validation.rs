//! Validation error type shared by configuration and argument checks

use crate::core::error_handling::ContextualError;

/// A user-actionable validation failure with a ready-to-print message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate that a count is greater than zero
pub fn validate_positive(name: &str, value: usize) -> Result<usize, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(&format!(
            "'{}' must be greater than 0",
            name
        )));
    }
    Ok(value)
}
