//! Private Access Token relay configuration.

use std::time::Duration;

/// Relay endpoint used when `PAT_VERIFICATION_URL` is not set. Deployments
/// point this at their platform's token relay.
pub const DEFAULT_VERIFY_URL: &str = "https://api.pat-relay.net/v1/verify";

/// Outbound call deadline used when `PAT_HTTP_TIMEOUT_MS` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Immutable relay settings, built once at startup and handed to
/// [`crate::PatVerifier`].
///
/// The relay cannot be consulted without an issuer and a key identity; a
/// config missing either is still valid to construct, and the verifier
/// answers `NotConfigured` instead of calling out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatConfig {
    verify_url: String,
    issuer_id: Option<String>,
    key_id: Option<String>,
    team_id: Option<String>,
    origin: Option<String>,
    timeout: Duration,
}

impl Default for PatConfig {
    fn default() -> Self {
        Self {
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            issuer_id: None,
            key_id: None,
            team_id: None,
            origin: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PatConfig {
    /// Read settings from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `PAT_VERIFICATION_URL` | relay endpoint (fixed default otherwise) |
    /// | `PAT_ISSUER_ID` / `PAT_ISSUER` | issuer identity |
    /// | `PAT_KEY_ID` / `PAT_KEYID` | key identity |
    /// | `PAT_TEAM_ID` | optional team identity |
    /// | `PAT_ORIGIN` / `APP_ORIGIN` | optional origin claim |
    /// | `PAT_HTTP_TIMEOUT_MS` | call deadline in milliseconds (default 5000) |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PatConfig::from_env`] but with an injectable variable source,
    /// so construction can be exercised without touching process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| non_empty(lookup(key)))
        };
        let timeout = non_empty(lookup("PAT_HTTP_TIMEOUT_MS"))
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            verify_url: first(&["PAT_VERIFICATION_URL"])
                .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string()),
            issuer_id: first(&["PAT_ISSUER_ID", "PAT_ISSUER"]),
            key_id: first(&["PAT_KEY_ID", "PAT_KEYID"]),
            team_id: first(&["PAT_TEAM_ID"]),
            origin: first(&["PAT_ORIGIN", "APP_ORIGIN"]),
            timeout,
        }
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }

    pub fn with_issuer_id(mut self, issuer_id: impl Into<String>) -> Self {
        self.issuer_id = Some(issuer_id.into());
        self
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn with_team_id(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the relay identity is complete enough to make a call.
    pub fn is_configured(&self) -> bool {
        self.issuer_id.is_some() && self.key_id.is_some()
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer_id.as_deref()
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
