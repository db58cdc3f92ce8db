//! Service configuration loaded from a TOML file.
//!
//! Only the HTTP layer's own knobs live here. Verifier identity and bypass
//! switches come from the process environment (see the `portcullis-pat`,
//! `portcullis-recaptcha`, and `portcullis-gate` config types), matching how
//! deployments inject secrets.

use crate::error::ServiceError;
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Settings for the HTTP service around the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Whether gated endpoints require a verification token. When false, a
    /// request with no token at all is admitted.
    #[serde(default = "default_verification_required")]
    pub verification_required: bool,
    /// Action label gated endpoints assert towards the score verifier.
    #[serde(default = "default_expected_action")]
    pub expected_action: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8090".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_verification_required() -> bool {
    true
}

fn default_expected_action() -> String {
    "general".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            verification_required: default_verification_required(),
            expected_action: default_expected_action(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file. Missing keys fall back to their
    /// defaults; a missing file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// The bind address, parsed.
    pub fn listen_addr(&self) -> Result<SocketAddr, ServiceError> {
        self.listen_addr
            .parse()
            .map_err(|_| ServiceError::ListenAddr(self.listen_addr.clone()))
    }
}
