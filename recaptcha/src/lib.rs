//! Score-based challenge verification.
//!
//! Sends a client-supplied challenge token to a remote scoring service and
//! accepts it only when the echoed action label matches and the trust score
//! clears the caller's threshold. All outcomes, including transport
//! failures, map onto a [`portcullis_types::ScoreVerdict`].

pub mod config;
pub mod verifier;

pub use config::RecaptchaConfig;
pub use verifier::{evaluate, Assessment, RecaptchaVerifier};
