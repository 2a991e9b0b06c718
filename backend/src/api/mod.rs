//! REST API modules.
//!
//! The data-generation endpoints are supplied by an external route table;
//! this module only carries the probes the server binary mounts by itself.

pub mod health;

use actix_web::web;

use crate::server::RouteTable;
use health::HealthState;

/// Route table serving the health probes.
///
/// # Examples
/// ```
/// use actix_web::web;
/// use synthgen::api::{ApiRoutes, health::HealthState};
///
/// let routes = ApiRoutes::new(web::Data::new(HealthState::new()));
/// ```
#[derive(Clone)]
pub struct ApiRoutes {
    health: web::Data<HealthState>,
}

impl ApiRoutes {
    /// Build the route table around shared health state.
    #[must_use]
    pub const fn new(health: web::Data<HealthState>) -> Self {
        Self { health }
    }
}

impl RouteTable for ApiRoutes {
    fn mount(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.health.clone())
            .service(health::ready)
            .service(health::live);
    }
}
