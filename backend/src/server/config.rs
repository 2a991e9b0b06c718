//! Server settings loaded via OrthoConfig.
//!
//! Values are layered from command-line flags, `SYNTHGEN_*` environment
//! variables and configuration files.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::middleware::{EmptySessionId, SessionIdExtractor};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 80;

/// Configuration values read once at process start.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SYNTHGEN")]
pub struct ServerSettings {
    /// Interface the HTTP listener binds to.
    pub host: Option<String>,
    /// Port the HTTP listener binds to.
    pub port: Option<u16>,
    /// Store an empty session identifier as `""` instead of treating it as
    /// absent.
    #[ortho_config(default = false)]
    pub keep_empty_session_id: bool,
}

impl ServerSettings {
    /// Return the configured host, falling back to the default.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Return the configured port, falling back to the default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host().to_owned(), self.port())
    }

    /// Session identifier extractor honouring the empty-value setting.
    #[must_use]
    pub const fn session_id_extractor(&self) -> SessionIdExtractor {
        let empty = if self.keep_empty_session_id {
            EmptySessionId::Keep
        } else {
            EmptySessionId::Ignore
        };
        SessionIdExtractor::new(empty)
    }
}
