//! Scoring service configuration.

use std::time::Duration;

/// Assessment endpoint used when `RECAPTCHA_VERIFY_URL` is not set.
pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Outbound call deadline used when `RECAPTCHA_HTTP_TIMEOUT_MS` is not set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Score threshold used when `RECAPTCHA_MIN_SCORE` is not set.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Immutable scoring service settings, built once at startup.
///
/// Without a secret the service cannot be consulted; the verifier answers
/// `NotConfigured` instead of calling out.
#[derive(Clone, Debug, PartialEq)]
pub struct RecaptchaConfig {
    secret_key: Option<String>,
    verify_url: String,
    timeout: Duration,
    default_min_score: f64,
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl RecaptchaConfig {
    /// Read settings from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `RECAPTCHA_SECRET_KEY` / `RECAPTCHA_SECRET` | shared secret for the scoring service |
    /// | `RECAPTCHA_VERIFY_URL` | assessment endpoint (fixed default otherwise) |
    /// | `RECAPTCHA_HTTP_TIMEOUT_MS` | call deadline in milliseconds (default 5000) |
    /// | `RECAPTCHA_MIN_SCORE` | default score threshold (default 0.5) |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RecaptchaConfig::from_env`] but with an injectable variable
    /// source, so construction can be exercised without touching process
    /// state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secret_key = non_empty(lookup("RECAPTCHA_SECRET_KEY"))
            .or_else(|| non_empty(lookup("RECAPTCHA_SECRET")));
        let verify_url = non_empty(lookup("RECAPTCHA_VERIFY_URL"))
            .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string());
        let timeout = non_empty(lookup("RECAPTCHA_HTTP_TIMEOUT_MS"))
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        let default_min_score = non_empty(lookup("RECAPTCHA_MIN_SCORE"))
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|score| score.is_finite())
            .map(|score| score.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_MIN_SCORE);

        Self {
            secret_key,
            verify_url,
            timeout,
            default_min_score,
        }
    }

    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_min_score(mut self, min_score: f64) -> Self {
        if min_score.is_finite() {
            self.default_min_score = min_score.clamp(0.0, 1.0);
        }
        self
    }

    /// Whether a secret is present, without exposing it.
    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    pub(crate) fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Threshold applied when the caller's policy does not name one.
    pub fn default_min_score(&self) -> f64 {
        self.default_min_score
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
