//! Request handlers.

use crate::extract::{request_context, VerificationTokens};
use crate::server::AppState;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use portcullis_types::{VerificationOutcome, VerificationPolicy};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;

/// Body of a contact-form submission.
///
/// Mail dispatch is a downstream collaborator; this service only decides
/// admission and acknowledges the submission.
#[derive(Debug, Deserialize)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub tokens: VerificationTokens,
}

/// Body of a bare verification call, with optional per-call policy
/// overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub action: Option<String>,
    pub min_score: Option<f64>,
    pub required: Option<bool>,
    #[serde(flatten)]
    pub tokens: VerificationTokens,
}

impl VerifyRequest {
    fn policy(self, base: &VerificationPolicy) -> (VerificationPolicy, VerificationTokens) {
        let mut policy = base.clone();
        if let Some(action) = self.action {
            policy = policy.with_expected_action(action);
        }
        if let Some(min_score) = self.min_score {
            policy = policy.with_min_score(min_score);
        }
        if let Some(required) = self.required {
            policy = policy.with_required(required);
        }
        (policy, self.tokens)
    }
}

/// The gated demo endpoint: admit first, then acknowledge the submission.
pub async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<ContactSubmission>,
) -> Response {
    let context = request_context(&headers, Some(peer), uri.path(), &body.tokens);
    let outcome = state.gate.evaluate(&context, &state.policy).await;

    if let Some(denial) = deny_response(&outcome) {
        return denial;
    }
    (StatusCode::OK, Json(json!({ "status": "accepted" }))).into_response()
}

/// Evaluate a request without a downstream action, returning the full
/// outcome on admission. Useful for callers that gate work of their own.
pub async fn verify(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<VerifyRequest>,
) -> Response {
    let (policy, tokens) = body.policy(&state.policy);
    let context = request_context(&headers, Some(peer), uri.path(), &tokens);
    let outcome = state.gate.evaluate(&context, &policy).await;

    if let Some(denial) = deny_response(&outcome) {
        return denial;
    }
    (StatusCode::OK, Json(outcome)).into_response()
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn export_metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics.render();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

/// Denials become the wire shape `{message, error, details?}` with the
/// outcome's HTTP status. Admissions return `None`.
fn deny_response(outcome: &VerificationOutcome) -> Option<Response> {
    let body = outcome.denial_body()?;
    let status =
        StatusCode::from_u16(outcome.http_status).unwrap_or(StatusCode::BAD_REQUEST);
    Some((status, Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_body_carries_flattened_tokens() {
        let body: ContactSubmission = serde_json::from_str(
            r#"{
                "name": "Ada",
                "message": "hello",
                "privateAccessToken": "pat-tok",
                "recaptchaToken": "rc-tok"
            }"#,
        )
        .unwrap();
        assert_eq!(body.name.as_deref(), Some("Ada"));
        assert_eq!(body.tokens.private_access_token.as_deref(), Some("pat-tok"));
        assert_eq!(body.tokens.recaptcha_token.as_deref(), Some("rc-tok"));
    }

    #[test]
    fn verify_body_overrides_only_what_it_names() {
        let body: VerifyRequest = serde_json::from_str(
            r#"{ "action": "checkout", "minScore": 0.7, "recaptchaToken": "rc-tok" }"#,
        )
        .unwrap();
        let base = VerificationPolicy::new();
        let (policy, tokens) = body.policy(&base);

        assert_eq!(policy.expected_action(), "checkout");
        assert_eq!(policy.min_score(), 0.7);
        assert!(policy.required());
        assert_eq!(tokens.recaptcha_token.as_deref(), Some("rc-tok"));
    }

    #[test]
    fn empty_verify_body_keeps_the_base_policy() {
        let (policy, _) = VerifyRequest::default().policy(
            &VerificationPolicy::new()
                .with_expected_action("contact")
                .with_required(false),
        );
        assert_eq!(policy.expected_action(), "contact");
        assert!(!policy.required());
    }
}
