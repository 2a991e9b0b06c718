//! Startup error types.
//!
//! Request handling never produces these: handler errors pass through the
//! middleware untouched and are rendered by actix.

use thiserror::Error;

use crate::logging::LoggingError;

/// Fatal error raised while assembling or binding the application.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The logging subscriber could not be installed.
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// Server settings could not be loaded.
    #[error("failed to load server settings: {0}")]
    Settings(String),
    /// The HTTP listener could not be bound.
    #[error("failed to bind HTTP listener: {0}")]
    Bind(#[source] std::io::Error),
}
