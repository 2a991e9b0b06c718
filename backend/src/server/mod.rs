//! Application assembly and server construction.
//!
//! [`create_application`] composes logging initialisation, the OpenAPI shell,
//! an externally supplied [`RouteTable`] and the [`LoggingContext`]
//! middleware into one [`Application`]. The application builds an actix
//! [`App`] per server worker; it owns no per-request state.

mod config;

pub use config::ServerSettings;

use std::future::Future;
use std::net::ToSocketAddrs;
use std::sync::Arc;

use actix_web::dev::{Server, ServerHandle, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiDocument;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::health::HealthState;
use crate::doc::ApiDoc;
use crate::error::StartupError;
use crate::logging::configure_logging;
use crate::middleware::{LoggingContext, SessionIdExtractor};

/// Path of the Swagger UI.
pub const DOCS_PATH: &str = "/docs";
/// Path of the ReDoc UI.
pub const REDOC_PATH: &str = "/redoc";
/// Path of the OpenAPI document.
pub const OPENAPI_PATH: &str = "/openapi.json";

/// Set of HTTP handlers mounted at the application root.
///
/// Any `Fn(&mut web::ServiceConfig)` closure that is `Send + Sync` is a
/// route table.
///
/// # Examples
/// ```
/// use actix_web::{HttpResponse, web};
/// use synthgen::server::RouteTable;
///
/// fn routes(cfg: &mut web::ServiceConfig) {
///     cfg.route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() }));
/// }
///
/// fn assert_route_table(_: &impl RouteTable) {}
/// assert_route_table(&routes);
/// ```
pub trait RouteTable: Send + Sync + 'static {
    /// Register the table's services on `cfg`.
    fn mount(&self, cfg: &mut web::ServiceConfig);
}

impl<F> RouteTable for F
where
    F: Fn(&mut web::ServiceConfig) + Send + Sync + 'static,
{
    fn mount(&self, cfg: &mut web::ServiceConfig) {
        self(cfg);
    }
}

/// Servable application: OpenAPI metadata, a shared route table and the
/// logging-context middleware wrapping every route.
pub struct Application<R> {
    routes: Arc<R>,
    interceptor: LoggingContext,
    openapi: OpenApiDocument,
}

impl<R> Clone for Application<R> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            interceptor: self.interceptor,
            openapi: self.openapi.clone(),
        }
    }
}

/// Assemble the application around `routes`.
///
/// Installs the global logging subscriber on first use, builds the OpenAPI
/// shell, mounts `routes` at the application root and wraps every route with
/// [`LoggingContext`]. Each call yields an independent application.
///
/// # Errors
/// Returns [`StartupError::Logging`] when the logging subscriber cannot be
/// installed.
///
/// # Examples
/// ```
/// use actix_web::{HttpResponse, web};
/// use synthgen::create_application;
///
/// let application = create_application(|cfg: &mut web::ServiceConfig| {
///     cfg.route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() }));
/// })?;
/// # Ok::<(), synthgen::StartupError>(())
/// ```
pub fn create_application<R: RouteTable>(routes: R) -> Result<Application<R>, StartupError> {
    configure_logging()?;
    Ok(Application {
        routes: Arc::new(routes),
        interceptor: LoggingContext::default(),
        openapi: ApiDoc::openapi(),
    })
}

impl<R: RouteTable> Application<R> {
    /// Replace the session identifier extraction policy.
    #[must_use]
    pub fn with_session_ids(mut self, extractor: SessionIdExtractor) -> Self {
        self.interceptor = LoggingContext::new(extractor);
        self
    }

    /// OpenAPI document served by the application.
    #[must_use]
    pub const fn openapi(&self) -> &OpenApiDocument {
        &self.openapi
    }

    /// Build the actix application for one server worker.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<R>,
    > {
        build_app(
            Arc::clone(&self.routes),
            self.interceptor,
            self.openapi.clone(),
        )
    }

    /// Bind an HTTP server to `addr` and start serving.
    ///
    /// The returned [`Server`] must be awaited to drive the listener. OS
    /// signal handling is disabled; stop the server through its handle, for
    /// example with [`drain_on`].
    ///
    /// # Errors
    /// Returns [`StartupError::Bind`] when the listener cannot be bound.
    pub fn serve(self, addr: impl ToSocketAddrs) -> Result<Server, StartupError> {
        let server = HttpServer::new(move || self.app())
            .disable_signals()
            .bind(addr)
            .map_err(StartupError::Bind)?;
        for addr in server.addrs() {
            info!(%addr, "listening");
        }
        Ok(server.run())
    }
}

/// Wait for `shutdown`, then mark the process as draining and stop the
/// server gracefully.
///
/// Liveness and readiness probes fail from the moment draining begins while
/// in-flight requests are allowed to finish.
pub async fn drain_on<F>(shutdown: F, health: web::Data<HealthState>, server: ServerHandle)
where
    F: Future<Output = ()>,
{
    shutdown.await;
    health.mark_unhealthy();
    info!("shutdown requested, draining");
    server.stop(true).await;
}

fn build_app<R: RouteTable>(
    routes: Arc<R>,
    interceptor: LoggingContext,
    openapi: OpenApiDocument,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(interceptor)
        .service(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, openapi.clone()))
        .service(Redoc::with_url(REDOC_PATH, openapi))
        .configure(move |cfg| routes.mount(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::health::ServerPhase;
    use crate::domain::RequestContext;
    use crate::middleware::EmptySessionId;
    use actix_web::http::StatusCode;
    use actix_web::{HttpResponse, test::{self}};

    fn echo_routes(cfg: &mut web::ServiceConfig) {
        cfg.route(
            "/echo/{tail:.*}",
            web::get().to(|| async {
                let context = RequestContext::current();
                HttpResponse::Ok().json(serde_json::json!({
                    "session_id": context.session_id(),
                    "endpoint": context.endpoint(),
                }))
            }),
        );
    }

    #[actix_web::test]
    async fn routes_are_mounted_at_the_root_and_wrapped() {
        let application = create_application(echo_routes).expect("application");
        let app = test::init_service(application.app()).await;
        let req = test::TestRequest::get()
            .uri("/echo/reports?session_id=Q1")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["session_id"], "Q1");
        assert_eq!(body["endpoint"], "/echo/reports");
    }

    #[actix_web::test]
    async fn openapi_document_is_served() {
        let application = create_application(echo_routes).expect("application");
        let app = test::init_service(application.app()).await;
        let req = test::TestRequest::get().uri(OPENAPI_PATH).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["info"]["version"], "0.0.1");
    }

    #[actix_web::test]
    async fn redoc_is_served() {
        let application = create_application(echo_routes).expect("application");
        let app = test::init_service(application.app()).await;
        let req = test::TestRequest::get().uri(REDOC_PATH).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn session_id_policy_can_be_overridden() {
        let application = create_application(echo_routes)
            .expect("application")
            .with_session_ids(SessionIdExtractor::new(EmptySessionId::Keep));
        let app = test::init_service(application.app()).await;
        let req = test::TestRequest::get()
            .uri("/echo/x?session_id=")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["session_id"], "");
    }

    #[test]
    fn applications_are_independent() {
        let first = create_application(echo_routes).expect("first application");
        let second = create_application(echo_routes).expect("second application");
        assert!(!Arc::ptr_eq(&first.routes, &second.routes));
        assert_eq!(first.openapi(), second.openapi());
    }

    #[actix_web::test]
    async fn shutdown_drains_health_and_stops_the_server() {
        let health = web::Data::new(HealthState::new());
        let server = create_application(echo_routes)
            .expect("application")
            .serve(("127.0.0.1", 0))
            .expect("listener binds");
        health.mark_ready();

        let drain = actix_web::rt::spawn(drain_on(
            std::future::ready(()),
            health.clone(),
            server.handle(),
        ));
        server.await.expect("server stops cleanly");
        drain.await.expect("drain task completes");

        assert_eq!(health.phase(), ServerPhase::Draining);
        assert!(!health.is_alive());
        assert!(!health.is_ready());
    }
}
