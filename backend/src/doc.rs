//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! metadata of the application shell: title, version, description and the
//! tags under which route tables publish their operations.
//!
//! The generated document is served at `/openapi.json` and rendered at
//! `/docs` (Swagger UI) and `/redoc`; `cargo run --bin openapi-dump` exports
//! it for external tooling.

use utoipa::OpenApi;

/// Tag grouping the synthetic data generation operations.
pub const SYNTHETIC_GENERATION_TAG: &str = "Synthetic Generation";

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "syntifAI - Synthetic Data Generation API",
        version = "0.0.1",
        description = "Synthetic data generation platform: database schema registration, \
natural-language driven data extraction, multi-table synthetic data generation with \
relationship preservation, quality, diagnostic and privacy analysis, and session-based \
reporting. Requests may carry an `X-Session-Id` header or `session_id` query parameter \
that correlates log records with the client session."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::api::health::ready,
        crate::api::health::live,
    ),
    tags(
        (name = SYNTHETIC_GENERATION_TAG, description = "Allow user to perform `Synthetic data generation`."),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
