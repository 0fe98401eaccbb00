//! Error types for the stream combinators.
//!
//! Building a stream never fails; these errors surface from terminal
//! consumers, from producer tasks that stop early, and from checked
//! [`Value`](crate::value::Value) accessors.

use thiserror::Error;

/// The main error type for the stream system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The other end of a channel went away before a value was handed over
    #[error("Channel was closed unexpectedly")]
    ChannelClosed,

    /// The stream's cancellation token fired
    #[error("Stream was cancelled")]
    Cancelled,

    /// A dynamic value was used as a type it does not hold
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A producer task panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Error::TypeMismatch { expected, found }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error only reports that a producer stopped early.
    ///
    /// Producer tasks treat these as a normal way to finish.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::ChannelClosed | Error::Cancelled)
    }
}

// Common conversions
impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::TaskFailed(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            Error::type_mismatch("int", "string").to_string(),
            "Type mismatch: expected int, found string"
        );
        assert_eq!(Error::from("boom").to_string(), "boom");
    }

    #[test]
    fn test_shutdown_classification() {
        assert!(Error::Cancelled.is_shutdown());
        assert!(Error::ChannelClosed.is_shutdown());
        assert!(!Error::custom("x").is_shutdown());
    }

    #[tokio::test]
    async fn test_oneshot_conversion() {
        let (tx, rx) = tokio::sync::oneshot::channel::<bool>();
        drop(tx);
        let err: Error = rx.await.unwrap_err().into();
        assert_eq!(err, Error::ChannelClosed);
    }
}
