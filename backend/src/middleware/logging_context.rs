//! Middleware binding the session identifier and endpoint of each request to
//! the logging context.
//!
//! Every request runs inside its own task-local [`RequestContext`] slot. The
//! slot is populated before the wrapped service is invoked and cleared on
//! every exit path, so log records emitted while handling the request carry
//! its session and endpoint and nothing else.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::domain::{ContextGuard, RequestContext};
use crate::middleware::session_id::SessionIdExtractor;

/// Middleware attaching the request's session identifier and endpoint to
/// [`RequestContext`] for the duration of the request.
///
/// Responses and errors from the wrapped service pass through untouched.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use synthgen::LoggingContext;
///
/// let app = App::new().wrap(LoggingContext::default());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingContext {
    extractor: SessionIdExtractor,
}

impl LoggingContext {
    /// Create the middleware with a custom session identifier extractor.
    #[must_use]
    pub const fn new(extractor: SessionIdExtractor) -> Self {
        Self { extractor }
    }

    /// Extractor used to read the session identifier.
    #[must_use]
    pub const fn extractor(&self) -> SessionIdExtractor {
        self.extractor
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggingContext
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggingContextMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggingContextMiddleware {
            service: Rc::new(service),
            extractor: self.extractor,
        }))
    }
}

/// Service wrapper produced by [`LoggingContext`].
///
/// Applications should not use this type directly.
pub struct LoggingContextMiddleware<S> {
    service: Rc<S>,
    extractor: SessionIdExtractor,
}

impl<S, B> Service<ServiceRequest> for LoggingContextMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session_id = self.extractor.extract(req.headers(), req.query_string());
        let endpoint = req.path().to_owned();
        let service = Rc::clone(&self.service);

        Box::pin(RequestContext::scope(async move {
            let _guard = ContextGuard::enter(session_id, Some(endpoint));
            debug!("request context attached");
            let outcome = service.call(req).await;
            if let Err(error) = &outcome {
                debug!(%error, "request handler failed");
            }
            outcome
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::session_id::{EmptySessionId, SESSION_ID_HEADER};
    use actix_web::dev::{ServiceFactory, fn_service};
    use actix_web::error::{ErrorBadRequest, ErrorInternalServerError};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;
    use std::cell::RefCell;
    use std::time::Duration;

    async fn echo_context() -> HttpResponse {
        let context = RequestContext::current();
        HttpResponse::Ok().json(serde_json::json!({
            "session_id": context.session_id(),
            "endpoint": context.endpoint(),
        }))
    }

    async fn observe(middleware: LoggingContext, req: test::TestRequest) -> serde_json::Value {
        let app = test::init_service(
            App::new()
                .wrap(middleware)
                .default_service(web::to(echo_context)),
        )
        .await;
        let body = test::call_and_read_body_json(&app, req.to_request()).await;
        assert!(RequestContext::current().is_empty());
        body
    }

    #[actix_web::test]
    async fn header_takes_precedence_over_query() {
        let req = test::TestRequest::get()
            .uri("/reports?session_id=Q1")
            .insert_header(("X-Session-Id", "H1"));
        let body = observe(LoggingContext::default(), req).await;
        assert_eq!(body["session_id"], "H1");
        assert_eq!(body["endpoint"], "/reports");
    }

    #[actix_web::test]
    async fn query_parameter_is_used_without_header() {
        let req = test::TestRequest::get().uri("/reports?session_id=Q1");
        let body = observe(LoggingContext::default(), req).await;
        assert_eq!(body["session_id"], "Q1");
    }

    #[actix_web::test]
    async fn session_id_is_absent_without_sources() {
        let req = test::TestRequest::get().uri("/reports");
        let body = observe(LoggingContext::default(), req).await;
        assert!(body["session_id"].is_null());
    }

    #[rstest]
    #[case("/foo/bar?x=1", "/foo/bar")]
    #[case("/foo/bar/", "/foo/bar/")]
    #[case("/", "/")]
    #[case("/Foo//Bar", "/Foo//Bar")]
    #[actix_web::test]
    async fn endpoint_is_the_exact_path(#[case] uri: &str, #[case] expected: &str) {
        let req = test::TestRequest::get().uri(uri);
        let body = observe(LoggingContext::default(), req).await;
        assert_eq!(body["endpoint"], expected);
    }

    #[actix_web::test]
    async fn empty_header_is_kept_when_configured() {
        let middleware = LoggingContext::new(SessionIdExtractor::new(EmptySessionId::Keep));
        let req = test::TestRequest::get()
            .uri("/reports?session_id=Q1")
            .insert_header((SESSION_ID_HEADER, ""));
        let body = observe(middleware, req).await;
        assert_eq!(body["session_id"], "");
    }

    #[actix_web::test]
    async fn handler_error_response_passes_through() {
        let app = test::init_service(App::new().wrap(LoggingContext::default()).route(
            "/fail",
            web::get().to(|| async {
                Err::<HttpResponse, _>(ErrorInternalServerError("generation failed"))
            }),
        ))
        .await;
        let req = test::TestRequest::get()
            .uri("/fail")
            .insert_header(("X-Session-Id", "abc"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = test::read_body(res).await;
        assert_eq!(body, "generation failed");
        assert!(RequestContext::current().is_empty());
    }

    #[actix_web::test]
    async fn inner_service_error_propagates_unchanged() {
        let observed = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&observed);
        let inner = fn_service(move |_req: ServiceRequest| {
            let sink = Rc::clone(&sink);
            async move {
                sink.replace(Some(RequestContext::current()));
                tokio::task::yield_now().await;
                Err::<ServiceResponse, Error>(ErrorBadRequest("rejected"))
            }
        })
        .new_service(())
        .await
        .expect("inner service");
        let middleware = LoggingContext::default()
            .new_transform(inner)
            .await
            .expect("middleware");

        let req = test::TestRequest::get()
            .uri("/reject?session_id=Q1")
            .to_srv_request();
        let error = middleware.call(req).await.err().expect("error propagates");

        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(error.to_string(), "rejected");
        let seen = observed.borrow().clone().expect("handler ran");
        assert_eq!(seen.session_id(), Some("Q1"));
        assert_eq!(seen.endpoint(), Some("/reject"));
        assert!(RequestContext::current().is_empty());
    }

    #[actix_web::test]
    async fn cancelled_request_leaves_no_context_behind() {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&observed);
        let inner = fn_service(move |req: ServiceRequest| {
            let sink = Rc::clone(&sink);
            async move {
                sink.borrow_mut().push(RequestContext::current());
                if req.path() == "/stall" {
                    std::future::pending::<()>().await;
                }
                Ok::<_, Error>(req.into_response(HttpResponse::Ok().finish()))
            }
        })
        .new_service(())
        .await
        .expect("inner service");
        let middleware = LoggingContext::default()
            .new_transform(inner)
            .await
            .expect("middleware");

        let stalled = test::TestRequest::get()
            .uri("/stall?session_id=abc")
            .to_srv_request();
        let outcome =
            tokio::time::timeout(Duration::from_millis(5), middleware.call(stalled)).await;
        assert!(outcome.is_err(), "the stalled request should be cancelled");
        assert!(RequestContext::current().is_empty());

        let next = test::TestRequest::get().uri("/next").to_srv_request();
        let res = middleware.call(next).await.expect("next request succeeds");
        assert_eq!(res.status(), StatusCode::OK);

        let seen = observed.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].session_id(), Some("abc"));
        assert_eq!(seen[0].endpoint(), Some("/stall"));
        assert_eq!(seen[1].session_id(), None);
        assert_eq!(seen[1].endpoint(), Some("/next"));
    }

    #[actix_web::test]
    async fn interleaved_requests_observe_their_own_context() {
        let app = test::init_service(App::new().wrap(LoggingContext::default()).default_service(
            web::to(|| async {
                let before = RequestContext::current();
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }
                actix_web::rt::time::sleep(Duration::from_millis(2)).await;
                let after = RequestContext::current();
                HttpResponse::Ok().json(serde_json::json!({
                    "before": before.session_id(),
                    "after": after.session_id(),
                    "endpoint": after.endpoint(),
                }))
            }),
        ))
        .await;

        let request = |session_id: &str, path: &str| {
            test::TestRequest::get()
                .uri(path)
                .insert_header(("X-Session-Id", session_id.to_owned()))
                .to_request()
        };
        let (a, b): (serde_json::Value, serde_json::Value) = futures::join!(
            test::call_and_read_body_json(&app, request("A", "/a")),
            test::call_and_read_body_json(&app, request("B", "/b")),
        );

        assert_eq!(a["before"], "A");
        assert_eq!(a["after"], "A");
        assert_eq!(a["endpoint"], "/a");
        assert_eq!(b["before"], "B");
        assert_eq!(b["after"], "B");
        assert_eq!(b["endpoint"], "/b");
    }
}
