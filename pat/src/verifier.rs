//! Outbound relay call and verdict mapping.

use crate::config::PatConfig;
use async_trait::async_trait;
use portcullis_types::{ErrorCode, PatVerdict, PatVerify, Rejection};
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::{json, Value};

/// Client for the Private Access Token relay.
///
/// One instance is built at startup and shared across requests; the inner
/// [`reqwest::Client`] pools connections. Every failure mode of the outbound
/// call maps onto a [`PatVerdict`], so calls cannot fail, only deny.
pub struct PatVerifier {
    config: PatConfig,
    http: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    token: &'a str,
    issuer: &'a str,
    key_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_ip: Option<&'a str>,
}

impl PatVerifier {
    pub fn new(config: PatConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    pub fn config(&self) -> &PatConfig {
        &self.config
    }
}

#[async_trait]
impl PatVerify for PatVerifier {
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> PatVerdict {
        let (issuer, key_id) = match (self.config.issuer_id(), self.config.key_id()) {
            (Some(issuer), Some(key_id)) => (issuer, key_id),
            _ => return PatVerdict::NotConfigured,
        };

        let token = token.trim();
        if token.is_empty() {
            return PatVerdict::Rejected(Rejection::new(
                ErrorCode::PatTokenMissing,
                "no token to verify",
            ));
        }

        let body = VerifyRequest {
            token,
            issuer,
            key_id,
            team_id: self.config.team_id(),
            origin: self.config.origin(),
            client_ip: remote_ip,
        };
        let mut request = self.http.post(self.config.verify_url()).json(&body);
        if let Some(user_agent) = user_agent {
            request = request.header(header::USER_AGENT, user_agent);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return PatVerdict::Rejected(Rejection::new(
                    ErrorCode::PatTimeout,
                    format!(
                        "relay did not answer within {}ms",
                        self.config.timeout().as_millis()
                    ),
                ));
            }
            Err(e) => {
                return PatVerdict::Rejected(
                    Rejection::new(ErrorCode::PatRequestFailed, "relay unreachable")
                        .with_details(json!({ "message": e.to_string() })),
                );
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return PatVerdict::Rejected(
                    Rejection::new(ErrorCode::PatRequestFailed, "relay response unreadable")
                        .with_details(json!({ "message": e.to_string() })),
                );
            }
        };
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let mut rejection =
                Rejection::new(ErrorCode::PatHttpError, format!("relay returned {status}"))
                    .with_status(status.as_u16());
            if let Some(body) = parsed {
                rejection = rejection.with_details(body);
            } else if !text.is_empty() {
                rejection = rejection.with_details(json!({ "body": text }));
            }
            return PatVerdict::Rejected(rejection);
        }

        match parsed.as_ref().and_then(accept_signal) {
            Some(true) => PatVerdict::Accepted {
                status: status.as_u16(),
                details: parsed,
            },
            Some(false) => {
                let mut rejection =
                    Rejection::new(ErrorCode::PatRejected, "relay rejected the token");
                if let Some(body) = parsed {
                    rejection = rejection.with_details(body);
                }
                PatVerdict::Rejected(rejection)
            }
            None => PatVerdict::Rejected(
                Rejection::new(
                    ErrorCode::PatRequestFailed,
                    "relay response carried no accept signal",
                )
                .with_details(json!({ "body": text })),
            ),
        }
    }
}

/// Pull the accept signal out of a relay response.
///
/// The relay schema is not pinned down, so several field spellings are
/// probed in a fixed order and the first one present decides: `isValid`,
/// then `valid`, then `success`, then `status == "ok"`.
fn accept_signal(body: &Value) -> Option<bool> {
    if let Some(v) = body.get("isValid").and_then(Value::as_bool) {
        return Some(v);
    }
    if let Some(v) = body.get("valid").and_then(Value::as_bool) {
        return Some(v);
    }
    if let Some(v) = body.get("success").and_then(Value::as_bool) {
        return Some(v);
    }
    if let Some(s) = body.get("status").and_then(Value::as_str) {
        return Some(s == "ok");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_signal_probes_in_order() {
        assert_eq!(accept_signal(&json!({ "isValid": true })), Some(true));
        assert_eq!(accept_signal(&json!({ "valid": true })), Some(true));
        assert_eq!(accept_signal(&json!({ "success": false })), Some(false));
        assert_eq!(accept_signal(&json!({ "status": "ok" })), Some(true));
        assert_eq!(accept_signal(&json!({ "status": "rejected" })), Some(false));
        assert_eq!(accept_signal(&json!({ "outcome": "fine" })), None);
        assert_eq!(accept_signal(&json!("yes")), None);
    }

    #[test]
    fn first_present_field_decides_on_disagreement() {
        // isValid outranks success when both are present.
        assert_eq!(
            accept_signal(&json!({ "isValid": true, "success": false })),
            Some(true)
        );
        assert_eq!(
            accept_signal(&json!({ "isValid": false, "status": "ok" })),
            Some(false)
        );
        // Non-boolean spellings are skipped, not treated as false.
        assert_eq!(
            accept_signal(&json!({ "isValid": "yes", "valid": true })),
            Some(true)
        );
    }

    #[test]
    fn request_body_uses_the_relay_field_names() {
        let body = VerifyRequest {
            token: "tok",
            issuer: "issuer-a",
            key_id: "key-a",
            team_id: Some("team-a"),
            origin: None,
            client_ip: Some("203.0.113.7"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "token": "tok",
                "issuer": "issuer-a",
                "keyId": "key-a",
                "teamId": "team-a",
                "clientIp": "203.0.113.7",
            })
        );
    }
}
