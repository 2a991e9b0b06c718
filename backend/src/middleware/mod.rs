//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! binding the logging context of each request.

pub mod logging_context;
pub mod session_id;

pub use logging_context::{LoggingContext, LoggingContextMiddleware};
pub use session_id::{
    EmptySessionId, SESSION_ID_HEADER, SESSION_ID_QUERY_PARAM, SessionIdExtractor,
};
