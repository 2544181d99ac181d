//! # Error Types
//!
//! Business outcomes on the board (unknown task names, overload, lock timeouts)
//! are never errors; they are reported through return values, the shutdown
//! signal and the observer. `BoardError` covers programmer errors, lifecycle
//! misuse and configuration problems.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Caller passed an argument that can never be valid (e.g. an empty task name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation is not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A periodic callback reported a failure
    #[error("Callback '{operation}' failed for {role}: {message}")]
    CallbackFailed {
        role: String,
        operation: String,
        message: String,
    },
}

impl BoardError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The failure of one periodic callback run, from an error or a panic message.
    pub fn callback_failed(
        role: impl Into<String>,
        operation: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        Self::CallbackFailed {
            role: role.into(),
            operation: operation.into(),
            message: cause.to_string(),
        }
    }
}

impl From<config::ConfigError> for BoardError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BoardError::invalid_argument("task name must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid argument: task name must not be empty"
        );

        let err = BoardError::callback_failed("dependent-1", "submit", "boom");
        assert_eq!(
            err.to_string(),
            "Callback 'submit' failed for dependent-1: boom"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: BoardError = config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, BoardError::Configuration(ref msg) if msg.contains("bad value")));
    }
}
