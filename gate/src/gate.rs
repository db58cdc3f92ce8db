//! The admission decision, end to end.

use crate::config::GateConfig;
use portcullis_types::{
    AdmissionMethod, ErrorCode, NoopTelemetry, PatVerdict, PatVerify, Rejection, RequestContext,
    ScoreVerdict, ScoreVerify, Telemetry, VerificationOutcome, VerificationPolicy,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// The gate ties the bypass switch and both verifiers into a single
/// admit/deny decision.
///
/// Strategy order is fixed: bypass, then the Private Access Token relay,
/// then score verification. A present-but-rejected proof is a hard deny and
/// never falls through; only a relay that is not configured at all does.
/// At most one outbound call is made per evaluation, there are no retries,
/// and every path terminates in exactly one [`VerificationOutcome`].
pub struct HumanVerificationGate {
    config: GateConfig,
    pat: Box<dyn PatVerify>,
    score: Box<dyn ScoreVerify>,
    telemetry: Arc<dyn Telemetry>,
}

impl HumanVerificationGate {
    pub fn new(
        config: GateConfig,
        pat: impl PatVerify + 'static,
        score: impl ScoreVerify + 'static,
    ) -> Self {
        Self {
            config,
            pat: Box::new(pat),
            score: Box::new(score),
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether one request is admitted.
    ///
    /// The context is read, never mutated; calling again with the same
    /// context, policy, and configuration yields the same outcome.
    pub async fn evaluate(
        &self,
        context: &RequestContext,
        policy: &VerificationPolicy,
    ) -> VerificationOutcome {
        let started = Instant::now();
        let outcome = self.decide(context, policy).await;
        self.finish(context, &outcome, started);
        outcome
    }

    async fn decide(
        &self,
        context: &RequestContext,
        policy: &VerificationPolicy,
    ) -> VerificationOutcome {
        if self.config.bypass() {
            tracing::info!(
                source = self.config.bypass_source().unwrap_or("config"),
                path = context.request_path().unwrap_or("-"),
                "verification bypass active"
            );
            return VerificationOutcome::admit(AdmissionMethod::Bypass);
        }

        if let Some(token) = context.pat_token() {
            match self
                .pat
                .verify(token, context.remote_addr(), context.user_agent())
                .await
            {
                PatVerdict::Accepted { status: _, details } => {
                    let mut outcome =
                        VerificationOutcome::admit(AdmissionMethod::PrivateAccessToken);
                    if let Some(details) = details {
                        outcome = outcome.with_details(details);
                    }
                    return outcome;
                }
                PatVerdict::Rejected(rejection) => {
                    // Hard deny: a present-but-invalid proof must not be
                    // retried through a different channel.
                    return denial(AdmissionMethod::PrivateAccessToken, rejection);
                }
                PatVerdict::NotConfigured => {
                    tracing::warn!(
                        path = context.request_path().unwrap_or("-"),
                        "proof token supplied but no relay identity is configured, \
                         falling back to score verification"
                    );
                }
            }
        }

        let Some(token) = context.recaptcha_token() else {
            if !policy.required() {
                return VerificationOutcome::admit(AdmissionMethod::None);
            }
            return VerificationOutcome::deny(
                AdmissionMethod::None,
                ErrorCode::MissingHumanToken,
                "verification token required",
            );
        };

        match self
            .score
            .verify(
                token,
                policy.expected_action(),
                policy.min_score(),
                context.remote_addr(),
            )
            .await
        {
            ScoreVerdict::Accepted { score, action } => {
                VerificationOutcome::admit(AdmissionMethod::Recaptcha)
                    .with_details(json!({ "score": score, "action": action }))
            }
            ScoreVerdict::Rejected(rejection) => denial(AdmissionMethod::Recaptcha, rejection),
            ScoreVerdict::NotConfigured => VerificationOutcome::deny(
                AdmissionMethod::None,
                ErrorCode::RecaptchaNotConfigured,
                "verification is not available for this deployment",
            ),
        }
    }

    /// One log line and one counter per terminal branch. Infallible.
    fn finish(&self, context: &RequestContext, outcome: &VerificationOutcome, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.telemetry.record_decision(outcome.method, outcome.admitted);
        self.telemetry.observe_eval_ms(elapsed_ms);

        let method = outcome.method.as_str();
        let path = context.request_path().unwrap_or("-");
        if outcome.admitted {
            tracing::info!(method, path, elapsed_ms, "request admitted");
            return;
        }

        let code = outcome.error_code.map(|code| code.as_str()).unwrap_or("-");
        let status = outcome.http_status;
        if status >= 500 {
            tracing::error!(method, code, status, path, elapsed_ms, "request denied");
        } else {
            tracing::warn!(method, code, status, path, elapsed_ms, "request denied");
        }
    }
}

fn denial(method: AdmissionMethod, rejection: Rejection) -> VerificationOutcome {
    let mut outcome = VerificationOutcome::deny_with_status(
        method,
        rejection.status,
        rejection.code,
        rejection.message,
    );
    if let Some(details) = rejection.details {
        outcome = outcome.with_details(details);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_nullables::{NullPatVerifier, NullScoreVerifier, RecordingTelemetry};

    fn open_gate(
        pat: &NullPatVerifier,
        score: &NullScoreVerifier,
    ) -> (HumanVerificationGate, Arc<RecordingTelemetry>) {
        gate_with_config(GateConfig::default(), pat, score)
    }

    fn gate_with_config(
        config: GateConfig,
        pat: &NullPatVerifier,
        score: &NullScoreVerifier,
    ) -> (HumanVerificationGate, Arc<RecordingTelemetry>) {
        let telemetry = Arc::new(RecordingTelemetry::new());
        let gate =
            HumanVerificationGate::new(config, pat.clone(), score.clone()).with_telemetry(telemetry.clone());
        (gate, telemetry)
    }

    fn both_tokens() -> RequestContext {
        RequestContext::new()
            .with_pat_token("pat-tok")
            .with_recaptcha_token("rc-tok")
            .with_remote_addr("203.0.113.5")
            .with_user_agent("storefront/2.1")
            .with_request_path("/api/contact")
    }

    // ── Bypass ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn bypass_admits_without_consulting_any_verifier() {
        let pat = NullPatVerifier::rejecting(Rejection::new(ErrorCode::PatRejected, "bad"));
        let score = NullScoreVerifier::rejecting(Rejection::new(ErrorCode::RecaptchaFailed, "bad"));
        let (gate, telemetry) =
            gate_with_config(GateConfig::default().with_bypass(true), &pat, &score);

        let outcome = gate
            .evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::Bypass);
        assert_eq!(pat.call_count(), 0);
        assert_eq!(score.call_count(), 0);
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.bypass.admitted".to_string()]
        );
    }

    #[tokio::test]
    async fn bypass_admits_even_with_no_tokens_under_a_required_policy() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, _) = gate_with_config(GateConfig::default().with_bypass(true), &pat, &score);

        let outcome = gate
            .evaluate(&RequestContext::new(), &VerificationPolicy::new())
            .await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::Bypass);
    }

    // ── Private Access Token chain ──────────────────────────────────────

    #[tokio::test]
    async fn accepted_pat_admits_without_touching_the_score_verifier() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        let outcome = gate
            .evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::PrivateAccessToken);
        assert_eq!(score.call_count(), 0);

        let calls = pat.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token, "pat-tok");
        assert_eq!(calls[0].remote_ip.as_deref(), Some("203.0.113.5"));
        assert_eq!(calls[0].user_agent.as_deref(), Some("storefront/2.1"));
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.private_access_token.admitted".to_string()]
        );
    }

    #[tokio::test]
    async fn rejected_pat_is_a_hard_deny_despite_a_valid_recaptcha_token() {
        let pat = NullPatVerifier::rejecting(
            Rejection::new(ErrorCode::PatRejected, "relay rejected the token")
                .with_details(json!({ "reason": "expired" })),
        );
        let score = NullScoreVerifier::accepting(1.0, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        let outcome = gate
            .evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::PrivateAccessToken);
        assert_eq!(outcome.http_status, 400);
        assert_eq!(outcome.error_code, Some(ErrorCode::PatRejected));
        assert_eq!(outcome.details, Some(json!({ "reason": "expired" })));
        assert_eq!(score.call_count(), 0, "a rejected proof must not fall back");
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.private_access_token.denied".to_string()]
        );
    }

    #[tokio::test]
    async fn pat_timeout_surfaces_as_504() {
        let pat = NullPatVerifier::rejecting(Rejection::new(
            ErrorCode::PatTimeout,
            "relay did not answer within 5000ms",
        ));
        let score = NullScoreVerifier::accepting(1.0, "general");
        let (gate, _) = open_gate(&pat, &score);

        let outcome = gate
            .evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.http_status, 504);
        assert_eq!(outcome.error_code, Some(ErrorCode::PatTimeout));
        assert_eq!(score.call_count(), 0);
    }

    #[tokio::test]
    async fn unconfigured_pat_falls_back_to_the_score_verifier() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        let outcome = gate
            .evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::Recaptcha);
        assert_eq!(pat.call_count(), 1);

        let calls = score.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].token, "rc-tok");
        assert_eq!(calls[0].expected_action, "general");
        assert_eq!(calls[0].min_score, 0.5);
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.recaptcha.admitted".to_string()]
        );
    }

    #[tokio::test]
    async fn absent_or_blank_pat_skips_the_relay_entirely() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, _) = open_gate(&pat, &score);

        let context = RequestContext::new()
            .with_pat_token("   ")
            .with_recaptcha_token("rc-tok");
        let outcome = gate.evaluate(&context, &VerificationPolicy::new()).await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::Recaptcha);
        assert_eq!(pat.call_count(), 0);
    }

    // ── Score verification ──────────────────────────────────────────────

    #[tokio::test]
    async fn policy_flows_through_to_the_score_verifier() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::accepting(0.8, "checkout");
        let (gate, _) = open_gate(&pat, &score);

        let policy = VerificationPolicy::new()
            .with_expected_action("checkout")
            .with_min_score(0.7);
        let outcome = gate.evaluate(&both_tokens(), &policy).await;

        assert!(outcome.admitted);
        let calls = score.calls();
        assert_eq!(calls[0].expected_action, "checkout");
        assert_eq!(calls[0].min_score, 0.7);
        assert_eq!(calls[0].remote_ip.as_deref(), Some("203.0.113.5"));
    }

    #[tokio::test]
    async fn score_rejection_carries_status_code_and_details() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::rejecting(
            Rejection::new(ErrorCode::RecaptchaFailed, "score 0.30 below required 0.50")
                .with_details(json!({ "score": 0.3, "action": "general" })),
        );
        let (gate, _) = open_gate(&pat, &score);

        let context = RequestContext::new().with_recaptcha_token("rc-tok");
        let outcome = gate.evaluate(&context, &VerificationPolicy::new()).await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::Recaptcha);
        assert_eq!(outcome.http_status, 400);
        assert_eq!(outcome.error_code, Some(ErrorCode::RecaptchaFailed));
        assert_eq!(outcome.details, Some(json!({ "score": 0.3, "action": "general" })));
    }

    #[tokio::test]
    async fn score_verifier_not_configured_is_a_503_denial() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::not_configured();
        let (gate, _) = open_gate(&pat, &score);

        let context = RequestContext::new().with_recaptcha_token("rc-tok");
        let outcome = gate.evaluate(&context, &VerificationPolicy::new()).await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::None);
        assert_eq!(outcome.http_status, 503);
        assert_eq!(outcome.error_code, Some(ErrorCode::RecaptchaNotConfigured));
    }

    // ── Missing tokens ──────────────────────────────────────────────────

    #[tokio::test]
    async fn no_tokens_with_an_optional_policy_admits_method_none() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        let policy = VerificationPolicy::new().with_required(false);
        let outcome = gate.evaluate(&RequestContext::new(), &policy).await;

        assert!(outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::None);
        assert_eq!(pat.call_count(), 0);
        assert_eq!(score.call_count(), 0);
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.none.admitted".to_string()]
        );
    }

    #[tokio::test]
    async fn no_tokens_with_a_required_policy_denies_400() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        let outcome = gate
            .evaluate(&RequestContext::new(), &VerificationPolicy::new())
            .await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.method, AdmissionMethod::None);
        assert_eq!(outcome.http_status, 400);
        assert_eq!(outcome.error_code, Some(ErrorCode::MissingHumanToken));
        assert_eq!(
            telemetry.counters(),
            vec!["human_verification.none.denied".to_string()]
        );
    }

    #[tokio::test]
    async fn unconfigured_pat_with_no_fallback_token_still_requires_one() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, _) = open_gate(&pat, &score);

        let context = RequestContext::new().with_pat_token("pat-tok");
        let outcome = gate.evaluate(&context, &VerificationPolicy::new()).await;

        assert!(!outcome.admitted);
        assert_eq!(outcome.error_code, Some(ErrorCode::MissingHumanToken));
        assert_eq!(pat.call_count(), 1);
        assert_eq!(score.call_count(), 0);
    }

    // ── Determinism and telemetry ───────────────────────────────────────

    #[tokio::test]
    async fn identical_calls_produce_identical_outcomes() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::accepting(0.7, "checkout");
        let (gate, telemetry) = open_gate(&pat, &score);

        let context = both_tokens();
        let policy = VerificationPolicy::new().with_expected_action("checkout");

        let first = gate.evaluate(&context, &policy).await;
        let second = gate.evaluate(&context, &policy).await;

        assert_eq!(first, second);
        assert_eq!(
            telemetry.counters(),
            vec![
                "human_verification.recaptcha.admitted".to_string(),
                "human_verification.recaptcha.admitted".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn every_evaluation_records_one_counter_and_one_timing() {
        let pat = NullPatVerifier::accepting();
        let score = NullScoreVerifier::accepting(0.9, "general");
        let (gate, telemetry) = open_gate(&pat, &score);

        gate.evaluate(&both_tokens(), &VerificationPolicy::new())
            .await;
        gate.evaluate(&RequestContext::new(), &VerificationPolicy::new())
            .await;

        assert_eq!(telemetry.counters().len(), 2);
        assert_eq!(telemetry.timings().len(), 2);
        assert!(telemetry.timings().iter().all(|ms| *ms >= 0.0));
    }

    #[tokio::test]
    async fn recaptcha_admission_carries_score_diagnostics() {
        let pat = NullPatVerifier::not_configured();
        let score = NullScoreVerifier::accepting(0.7, "checkout");
        let (gate, _) = open_gate(&pat, &score);

        let policy = VerificationPolicy::new().with_expected_action("checkout");
        let outcome = gate.evaluate(&both_tokens(), &policy).await;

        assert!(outcome.admitted);
        assert_eq!(
            outcome.details,
            Some(json!({ "score": 0.7, "action": "checkout" }))
        );
    }
}
