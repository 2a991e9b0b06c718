//! Process-wide logging setup.
//!
//! Events are filtered through `RUST_LOG` and written to stdout as JSON lines
//! by [`ContextJsonFormat`], which stamps every record with the session
//! identifier and endpoint of the request in scope.

mod format;

pub use format::ContextJsonFormat;

use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoggingError {
    /// Another global subscriber was already installed, or the subscriber
    /// could not be initialised.
    #[error("failed to install the tracing subscriber: {0}")]
    Install(String),
}

static LOGGING: OnceLock<Result<(), LoggingError>> = OnceLock::new();

/// Install the global JSON subscriber.
///
/// Only the first call performs the installation; later calls return the
/// outcome of that first attempt.
///
/// # Errors
/// Returns [`LoggingError::Install`] when a global subscriber is already set
/// by another component.
pub fn configure_logging() -> Result<(), LoggingError> {
    LOGGING
        .get_or_init(|| {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .event_format(ContextJsonFormat)
                .try_init()
                .map_err(|error| LoggingError::Install(error.to_string()))
        })
        .clone()
}
