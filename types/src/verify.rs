//! Strategy seams between the gate and its remote verifiers.
//!
//! The gate consumes these traits; the `portcullis-pat` and
//! `portcullis-recaptcha` crates provide the real implementations and the
//! nullables crate provides scripted ones for tests. Verdicts are infallible
//! by construction: a verifier that cannot do its job reports that as a
//! [`Rejection`], never as a panic or an `Err` the gate could forget to map.

use crate::code::ErrorCode;
use async_trait::async_trait;
use serde_json::Value;

/// A denial reported by a verifier, carrying everything needed to answer the
/// caller.
#[derive(Clone, Debug, PartialEq)]
pub struct Rejection {
    /// HTTP status the gate should surface.
    pub status: u16,
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable reason.
    pub message: String,
    /// Opaque upstream payload, when one exists.
    pub details: Option<Value>,
}

impl Rejection {
    /// A rejection at the code's default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.default_status(),
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Override the surfaced status, for upstream-dictated codes.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Attach the upstream response payload.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Verdict from the Private Access Token relay.
#[derive(Clone, Debug, PartialEq)]
pub enum PatVerdict {
    /// No relay identity is configured on this deployment. The gate treats
    /// the token as unverifiable and falls through to the next strategy.
    NotConfigured,
    /// The relay accepted the proof.
    Accepted {
        /// Upstream HTTP status.
        status: u16,
        /// Relay response body, when it parsed.
        details: Option<Value>,
    },
    /// The relay turned the proof down, or the call itself failed.
    Rejected(Rejection),
}

/// Verdict from the score verifier.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreVerdict {
    /// No scoring secret is configured on this deployment.
    NotConfigured,
    /// The action matched and the score cleared the threshold.
    Accepted {
        /// Score reported by the scoring service.
        score: f64,
        /// Action echoed back by the scoring service.
        action: String,
    },
    /// The assessment failed, or the call itself did.
    Rejected(Rejection),
}

/// Checks an anonymous proof token against the remote relay.
#[async_trait]
pub trait PatVerify: Send + Sync {
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> PatVerdict;
}

/// Checks a challenge token against the remote scoring service.
#[async_trait]
pub trait ScoreVerify: Send + Sync {
    async fn verify(
        &self,
        token: &str,
        expected_action: &str,
        min_score: f64,
        remote_ip: Option<&str>,
    ) -> ScoreVerdict;
}
