//! Outbound assessment call and score evaluation.

use crate::config::RecaptchaConfig;
use async_trait::async_trait;
use portcullis_types::{ErrorCode, Rejection, ScoreVerdict, ScoreVerify};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One assessment as reported by the scoring service.
///
/// Only `success`, `action` and `score` drive the verdict; the rest is
/// carried into diagnostics untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub success: bool,
    pub score: Option<f64>,
    pub action: Option<String>,
    pub challenge_ts: Option<String>,
    pub hostname: Option<String>,
    #[serde(rename = "error-codes", default, skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<String>,
}

/// Decide a verdict from an assessment the service already delivered.
///
/// Split out from the transport so the acceptance rule is testable on its
/// own: the token counts only when the service itself accepted it, the
/// echoed action equals `expected_action` exactly, and the score is at least
/// `min_score`. A score exactly at the threshold passes.
pub fn evaluate(assessment: &Assessment, expected_action: &str, min_score: f64) -> ScoreVerdict {
    if !assessment.success {
        return ScoreVerdict::Rejected(
            Rejection::new(ErrorCode::RecaptchaFailed, "scoring service rejected the token")
                .with_details(json!({ "errorCodes": assessment.error_codes })),
        );
    }

    let action = assessment.action.as_deref().unwrap_or_default();
    if action != expected_action {
        return ScoreVerdict::Rejected(
            Rejection::new(
                ErrorCode::RecaptchaFailed,
                format!("action mismatch: expected {expected_action:?}, got {action:?}"),
            )
            .with_details(json!({
                "action": assessment.action,
                "score": assessment.score,
            })),
        );
    }

    let Some(score) = assessment.score else {
        return ScoreVerdict::Rejected(Rejection::new(
            ErrorCode::RecaptchaFailed,
            "assessment carried no score",
        ));
    };
    if score < min_score {
        return ScoreVerdict::Rejected(
            Rejection::new(
                ErrorCode::RecaptchaFailed,
                format!("score {score:.2} below required {min_score:.2}"),
            )
            .with_details(json!({ "action": action, "score": score })),
        );
    }

    ScoreVerdict::Accepted {
        score,
        action: action.to_string(),
    }
}

/// Client for the remote scoring service.
pub struct RecaptchaVerifier {
    config: RecaptchaConfig,
    http: Client,
}

impl RecaptchaVerifier {
    pub fn new(config: RecaptchaConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    pub fn config(&self) -> &RecaptchaConfig {
        &self.config
    }
}

#[async_trait]
impl ScoreVerify for RecaptchaVerifier {
    async fn verify(
        &self,
        token: &str,
        expected_action: &str,
        min_score: f64,
        remote_ip: Option<&str>,
    ) -> ScoreVerdict {
        let Some(secret) = self.config.secret_key() else {
            return ScoreVerdict::NotConfigured;
        };

        let token = token.trim();
        if token.is_empty() {
            return ScoreVerdict::Rejected(Rejection::new(
                ErrorCode::MissingHumanToken,
                "no token to assess",
            ));
        }

        let mut form = vec![("secret", secret), ("response", token)];
        if let Some(remote_ip) = remote_ip {
            form.push(("remoteip", remote_ip));
        }

        let response = match self.http.post(self.config.verify_url()).form(&form).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ScoreVerdict::Rejected(Rejection::new(
                    ErrorCode::RecaptchaTimeout,
                    format!(
                        "scoring service did not answer within {}ms",
                        self.config.timeout().as_millis()
                    ),
                ));
            }
            Err(e) => {
                return ScoreVerdict::Rejected(
                    Rejection::new(ErrorCode::RecaptchaRequestFailed, "scoring service unreachable")
                        .with_details(json!({ "message": e.to_string() })),
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let mut rejection = Rejection::new(
                ErrorCode::RecaptchaHttpError,
                format!("scoring service returned {status}"),
            )
            .with_status(status.as_u16());
            if let Some(body) = body {
                rejection = rejection.with_details(body);
            }
            return ScoreVerdict::Rejected(rejection);
        }

        let assessment: Assessment = match response.json().await {
            Ok(assessment) => assessment,
            Err(e) => {
                return ScoreVerdict::Rejected(
                    Rejection::new(ErrorCode::RecaptchaRequestFailed, "assessment unreadable")
                        .with_details(json!({ "message": e.to_string() })),
                );
            }
        };

        evaluate(&assessment, expected_action, min_score)
    }
}
