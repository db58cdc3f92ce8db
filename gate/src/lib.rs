//! Admission orchestration.
//!
//! [`HumanVerificationGate`] decides, for one inbound request, whether it is
//! admitted: bypass switch first, then the Private Access Token relay, then
//! the score verifier, in a fixed priority order with no retries. Exactly one
//! [`portcullis_types::VerificationOutcome`] comes back per call, whatever
//! the remote services do.

pub mod config;
pub mod gate;

pub use config::GateConfig;
pub use gate::HumanVerificationGate;
