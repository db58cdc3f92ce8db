//! Nullable infrastructure for deterministic testing.
//!
//! The gate's external dependencies (two remote verifiers, telemetry) sit
//! behind traits. This crate provides scripted implementations that:
//! - Return a programmed verdict instead of calling anything
//! - Record every call for later assertion
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod telemetry;
pub mod verifiers;

pub use telemetry::RecordingTelemetry;
pub use verifiers::{NullPatVerifier, NullScoreVerifier, PatCall, ScoreCall};
