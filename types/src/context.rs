//! Per-request input to the admission gate.

/// Everything the gate knows about one inbound request.
///
/// Built fresh by the HTTP layer for every request and discarded once the
/// outcome is produced. All fields are normalized on construction: values are
/// trimmed, and blank values collapse to absent, so accessors never return an
/// empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    private_access_token: Option<String>,
    recaptcha_token: Option<String>,
    remote_addr: Option<String>,
    user_agent: Option<String>,
    request_path: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Private Access Token proof. Blank values are treated as if no
    /// token was supplied.
    pub fn with_pat_token(mut self, token: impl Into<String>) -> Self {
        self.private_access_token = normalize(token.into());
        self
    }

    /// Set the challenge token for the score verifier. Blank values are
    /// treated as if no token was supplied.
    pub fn with_recaptcha_token(mut self, token: impl Into<String>) -> Self {
        self.recaptcha_token = normalize(token.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = normalize(addr.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = normalize(user_agent.into());
        self
    }

    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = normalize(path.into());
        self
    }

    pub fn pat_token(&self) -> Option<&str> {
        self.private_access_token.as_deref()
    }

    pub fn recaptcha_token(&self) -> Option<&str> {
        self.recaptcha_token.as_deref()
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
