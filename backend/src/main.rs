//! Server entry-point: loads settings, assembles the application and serves it.

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};

use synthgen::api::{ApiRoutes, health::HealthState};
use synthgen::server::drain_on;
use synthgen::{ServerSettings, StartupError, create_application};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|error| StartupError::Settings(error.to_string()))?;

    let health_state = web::Data::new(HealthState::new());
    let application = create_application(ApiRoutes::new(health_state.clone()))?
        .with_session_ids(settings.session_id_extractor());

    let server = application.serve(settings.bind_addr())?;
    health_state.mark_ready();
    info!(host = settings.host(), port = settings.port(), "server started");

    actix_web::rt::spawn(drain_on(shutdown_signal(), health_state, server.handle()));
    server.await.wrap_err("server terminated unexpectedly")
}

/// Resolve on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                    _ = terminate.recv() => {}
                }
            }
            Err(error) => {
                warn!(%error, "SIGTERM handler unavailable");
                log_ctrl_c(tokio::signal::ctrl_c().await);
            }
        }
    }
    #[cfg(not(unix))]
    log_ctrl_c(tokio::signal::ctrl_c().await);
}

fn log_ctrl_c(result: std::io::Result<()>) {
    if let Err(error) = result {
        warn!(%error, "Ctrl-C handler failed; shutting down");
    }
}
