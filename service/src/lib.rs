//! HTTP service embedding the admission gate.
//!
//! Thin axum layer in front of [`portcullis_gate::HumanVerificationGate`]:
//! it extracts tokens from headers and bodies, asks the gate for a decision,
//! and turns denials into the wire shape callers expect. Also serves health
//! and Prometheus metrics endpoints.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod server;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use metrics::GateMetrics;
pub use server::{build_router, run, serve, AppState};
