//! Core error types

use thiserror::Error;

/// Errors raised at the host thread boundary
#[derive(Error, Debug)]
pub enum CoreError {
    /// An operation was attempted from a thread that is not allowed to perform it
    #[error("Wrong thread: {0}")]
    WrongThread(String),

    /// The receiving side of an event queue is gone
    #[error("Event queue disconnected: {0}")]
    Disconnected(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
