//! Domain primitives.
//!
//! Purpose: Hold the per-request state shared between the HTTP layer and the
//! logging sink. Types here are framework-agnostic; actix-specific wiring lives
//! in [`crate::middleware`].
//!
//! Public surface:
//! - RequestContext (alias to `request_context::RequestContext`): session id
//!   and endpoint of the request in scope.

pub mod request_context;

pub use self::request_context::RequestContext;
pub(crate) use self::request_context::ContextGuard;
