//! Liveness and readiness probes mounted by the server binary.
//!
//! The server moves through three phases: `starting` until the listener is
//! bound, `serving` while it accepts traffic and `draining` once shutdown
//! begins. Readiness holds only while serving; liveness fails once draining.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

/// Lifecycle phase reported by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerPhase {
    /// Listener not yet bound.
    Starting,
    /// Accepting traffic.
    Serving,
    /// Shutting down; new traffic should go elsewhere.
    Draining,
}

impl ServerPhase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Serving,
            _ => Self::Draining,
        }
    }

    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Serving => 1,
            Self::Draining => 2,
        }
    }
}

/// Body returned by both probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeBody {
    /// Current lifecycle phase.
    pub phase: ServerPhase,
}

/// Shared lifecycle phase read by the probes.
#[derive(Debug)]
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(ServerPhase::Starting.as_u8()),
        }
    }
}

impl HealthState {
    /// Create state in the `starting` phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the `serving` phase. Has no effect once draining.
    pub fn mark_ready(&self) {
        // A failed exchange means shutdown already began.
        let _draining = self.phase.compare_exchange(
            ServerPhase::Starting.as_u8(),
            ServerPhase::Serving.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Enter the `draining` phase so both probes fail.
    pub fn mark_unhealthy(&self) {
        self.phase.store(ServerPhase::Draining.as_u8(), Ordering::Release);
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ServerPhase {
        ServerPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Whether the server accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase() == ServerPhase::Serving
    }

    /// Whether the process should be kept running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.phase() != ServerPhase::Draining
    }

    fn probe_response(&self, probe_ok: bool) -> HttpResponse {
        let phase = self.phase();
        debug!(?phase, probe_ok, "health probe answered");
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(ProbeBody { phase })
    }
}

/// Readiness probe: 200 while serving, 503 while starting or draining.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server accepts traffic", body = ProbeBody),
        (status = 503, description = "Server is starting or draining", body = ProbeBody)
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_ready())
}

/// Liveness probe: 200 until draining begins.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Process is alive", body = ProbeBody),
        (status = 503, description = "Process is draining", body = ProbeBody)
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_alive())
}
