//! Builds a [`RequestContext`] from the pieces of an HTTP request.
//!
//! The gate never parses HTTP itself; this module is the one place that
//! knows where tokens live on the wire: the `Private-Token` header or the
//! `privateAccessToken` / `privateToken` body fields for proof tokens, and
//! the `recaptchaToken` body field for challenge tokens.

use axum::http::HeaderMap;
use portcullis_types::RequestContext;
use serde::Deserialize;
use std::net::SocketAddr;

/// Header carrying a Private Access Token proof.
pub const PRIVATE_TOKEN_HEADER: &str = "private-token";

/// Token fields accepted in request bodies. Meant to be `#[serde(flatten)]`ed
/// into endpoint-specific body types.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTokens {
    pub private_access_token: Option<String>,
    pub private_token: Option<String>,
    pub recaptcha_token: Option<String>,
}

impl VerificationTokens {
    /// The proof token from the body, preferring the long field name.
    fn pat_token(&self) -> Option<&str> {
        self.private_access_token
            .as_deref()
            .or(self.private_token.as_deref())
    }
}

/// Assemble the gate's input from headers, peer address, path, and body
/// tokens. The header wins over body fields for the proof token.
pub fn request_context(
    headers: &HeaderMap,
    remote: Option<SocketAddr>,
    path: &str,
    tokens: &VerificationTokens,
) -> RequestContext {
    let mut context = RequestContext::new().with_request_path(path);

    if let Some(token) = header_str(headers, PRIVATE_TOKEN_HEADER).or_else(|| tokens.pat_token()) {
        context = context.with_pat_token(token);
    }
    if let Some(token) = tokens.recaptcha_token.as_deref() {
        context = context.with_recaptcha_token(token);
    }
    if let Some(addr) = client_ip(headers, remote) {
        context = context.with_remote_addr(addr);
    }
    if let Some(user_agent) = header_str(headers, "user-agent") {
        context = context.with_user_agent(user_agent);
    }

    context
}

/// The client address: first `X-Forwarded-For` entry when present, else the
/// peer address.
fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    remote.map(|addr| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
