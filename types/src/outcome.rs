//! The gate's answer for a single request.

use crate::code::ErrorCode;
use crate::method::AdmissionMethod;
use serde::Serialize;
use serde_json::Value;

/// The admission decision for one request, plus everything the HTTP layer
/// needs to respond when the answer is no.
///
/// On admission `http_status` is 200 and the denial fields are empty; on
/// denial `error_code` is always present and [`VerificationOutcome::denial_body`]
/// yields the wire body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerificationOutcome {
    /// Whether the request may proceed.
    pub admitted: bool,
    /// The strategy that produced the decision.
    pub method: AdmissionMethod,
    /// Status for the HTTP layer. Meaningful on denial; 200 on admission.
    pub http_status: u16,
    /// Machine-readable denial code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Human-readable denial reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque diagnostic payload passed through from the remote verifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl VerificationOutcome {
    /// An admission via `method`.
    pub fn admit(method: AdmissionMethod) -> Self {
        Self {
            admitted: true,
            method,
            http_status: 200,
            error_code: None,
            message: None,
            details: None,
        }
    }

    /// A denial carrying the code's default status.
    pub fn deny(method: AdmissionMethod, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::deny_with_status(method, code.default_status(), code, message)
    }

    /// A denial with an explicit status, for codes whose status is dictated
    /// by the upstream response.
    pub fn deny_with_status(
        method: AdmissionMethod,
        http_status: u16,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            admitted: false,
            method,
            http_status,
            error_code: Some(code),
            message: Some(message.into()),
            details: None,
        }
    }

    /// Attach an upstream diagnostic payload.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The response body for a denied request. `None` when admitted.
    pub fn denial_body(&self) -> Option<DenialBody> {
        if self.admitted {
            return None;
        }
        Some(DenialBody {
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "request denied".to_string()),
            error: self.error_code.unwrap_or(ErrorCode::MissingHumanToken),
            details: self.details.clone(),
        })
    }

    /// The outcome half of the `human_verification.<method>.<outcome>`
    /// telemetry convention.
    pub fn outcome_label(&self) -> &'static str {
        if self.admitted {
            "admitted"
        } else {
            "denied"
        }
    }
}

/// Wire shape returned to callers when a request is denied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DenialBody {
    /// Human-readable explanation.
    pub message: String,
    /// Machine-readable code.
    pub error: ErrorCode,
    /// Opaque diagnostic payload from the remote verifier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
