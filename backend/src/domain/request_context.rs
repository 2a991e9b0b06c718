//! Request-scoped logging context.
//!
//! [`RequestContext`] carries the session identifier and endpoint of the
//! request currently being handled. It lives in task-local storage so that
//! requests interleaved on the same executor thread each observe their own
//! values; the slot is bound to the request future rather than to a thread.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Use
//! [`RequestContext::scope_with`] together with [`RequestContext::current`]
//! when spawning new tasks, or [`RequestContext::sync_scope`] when moving work
//! onto blocking threads, so the active context propagates.

use std::cell::RefCell;
use std::future::Future;

use tokio::task_local;

task_local! {
    /// Task-local slot holding the context of the request in scope.
    static REQUEST_CONTEXT: RefCell<RequestContext>;
}

/// Session identifier and endpoint of the request in scope.
///
/// Both fields are absent outside a request, which is what background and
/// startup logging observe.
///
/// # Examples
/// ```
/// use synthgen::RequestContext;
///
/// let context = RequestContext::current();
/// assert!(context.is_empty());
/// assert_eq!(context.session_id(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    session_id: Option<String>,
    endpoint: Option<String>,
}

impl RequestContext {
    /// Build a context with the supplied values.
    #[must_use]
    pub fn new(session_id: Option<String>, endpoint: Option<String>) -> Self {
        Self {
            session_id,
            endpoint,
        }
    }

    /// Snapshot of the context for the request in scope.
    ///
    /// Returns the all-absent default when called outside a request scope.
    #[must_use]
    pub fn current() -> Self {
        REQUEST_CONTEXT
            .try_with(|slot| slot.borrow().clone())
            .unwrap_or_default()
    }

    /// Session identifier supplied by the client, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Path of the endpoint being served, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Returns `true` when neither field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.endpoint.is_none()
    }

    /// Run `fut` with a fresh, empty context slot of its own.
    ///
    /// # Examples
    /// ```
    /// use synthgen::RequestContext;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let observed = RequestContext::scope(async { RequestContext::current() }).await;
    /// assert!(observed.is_empty());
    /// # });
    /// ```
    pub async fn scope<Fut>(fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        Self::scope_with(Self::default(), fut).await
    }

    /// Run `fut` with its own slot seeded from `context`.
    ///
    /// Writes made inside `fut` never reach the caller's slot.
    ///
    /// # Examples
    /// ```
    /// use synthgen::RequestContext;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let context = RequestContext::new(Some("abc".into()), Some("/reports".into()));
    /// let observed = RequestContext::scope_with(context.clone(), async {
    ///     RequestContext::current()
    /// })
    /// .await;
    /// assert_eq!(observed, context);
    /// # });
    /// ```
    pub async fn scope_with<Fut>(context: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        REQUEST_CONTEXT.scope(RefCell::new(context), fut).await
    }

    /// Run the closure `f` with its own slot seeded from `context`.
    pub fn sync_scope<F, R>(context: Self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        REQUEST_CONTEXT.sync_scope(RefCell::new(context), f)
    }
}

/// Store the session identifier for the request in scope.
///
/// Outside a request scope the write is discarded.
pub(crate) fn set_session(session_id: Option<String>) {
    update(|context| context.session_id = session_id);
}

/// Store the endpoint for the request in scope.
///
/// Outside a request scope the write is discarded.
pub(crate) fn set_endpoint(endpoint: Option<String>) {
    update(|context| context.endpoint = endpoint);
}

fn update(apply: impl FnOnce(&mut RequestContext)) {
    // AccessError only means no request is in scope.
    let _outside_scope = REQUEST_CONTEXT.try_with(|slot| apply(&mut slot.borrow_mut()));
}

/// Populates the context on creation and clears it when dropped.
///
/// Dropping happens on every exit from the enclosing future: normal
/// completion, an error return, a panic unwinding through it, and
/// cancellation of the future mid-flight.
#[derive(Debug)]
#[must_use = "the context is cleared as soon as the guard is dropped"]
pub(crate) struct ContextGuard {
    _private: (),
}

impl ContextGuard {
    pub(crate) fn enter(session_id: Option<String>, endpoint: Option<String>) -> Self {
        set_session(session_id);
        set_endpoint(endpoint);
        Self { _private: () }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        set_session(None);
        set_endpoint(None);
    }
}
