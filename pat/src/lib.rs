//! Private Access Token verification.
//!
//! Checks anonymous proof tokens against a remote relay endpoint. The relay
//! is a black box consumed over HTTP; this crate owns the outbound call, the
//! response interpretation, and the mapping of every failure mode onto a
//! [`portcullis_types::PatVerdict`].

pub mod config;
pub mod verifier;

pub use config::PatConfig;
pub use verifier::PatVerifier;
