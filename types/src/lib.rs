//! Fundamental types shared across the portcullis admission gate.
//!
//! Everything here is deliberately free of I/O: request inputs, per-call
//! policy, the outcome produced by the gate, the closed set of denial codes,
//! and the seams (verifier traits, telemetry) the rest of the workspace plugs
//! into.

pub mod code;
pub mod context;
pub mod method;
pub mod outcome;
pub mod policy;
pub mod telemetry;
pub mod verify;

pub use code::ErrorCode;
pub use context::RequestContext;
pub use method::AdmissionMethod;
pub use outcome::{DenialBody, VerificationOutcome};
pub use policy::VerificationPolicy;
pub use telemetry::{counter_name, NoopTelemetry, Telemetry};
pub use verify::{PatVerdict, PatVerify, Rejection, ScoreVerdict, ScoreVerify};
