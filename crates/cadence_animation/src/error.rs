//! Error types for cadence_animation

use thiserror::Error;

/// Errors returned to callers that configure or register animations
///
/// Failures inside running animations are never reported here; they are
/// logged and cancel only the task that failed.
#[derive(Error, Debug)]
pub enum AnimationError {
    /// A time magnitude, repeat count or interval was out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The scheduler behind a handle no longer exists
    #[error("Animation scheduler has been dropped")]
    SchedulerDropped,

    /// `set_global_scheduler()` was called more than once
    #[error("Global animation scheduler already initialized")]
    AlreadyInitialized,

    /// No global scheduler has been installed yet
    #[error("Animation scheduler not initialized. Call set_global_scheduler() at app startup.")]
    NotInitialized,

    /// The background ticker thread could not be started
    #[error("Failed to start animation ticker: {0}")]
    Ticker(String),

    /// Reading a configuration file failed
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for cadence_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
