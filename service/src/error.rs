//! Service-level error types.

use thiserror::Error;

/// Errors raised while configuring or running the HTTP service.
///
/// Admission denials are not errors; they flow through
/// [`portcullis_types::VerificationOutcome`]. This type covers the ways the
/// service itself can fail to start or serve.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid listen address: {0}")]
    ListenAddr(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
