//! Synthetic data generation API: application bootstrap and request-scoped
//! logging context.
//!
//! Every request handled by an [`Application`] runs with its own
//! [`RequestContext`] carrying the client session identifier and the endpoint
//! path; log records emitted while handling the request are stamped with both.

pub mod api;
pub mod doc;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::RequestContext;
pub use error::StartupError;
pub use logging::configure_logging;
pub use middleware::LoggingContext;
pub use server::{Application, RouteTable, ServerSettings, create_application};
