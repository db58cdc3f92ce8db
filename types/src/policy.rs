//! Per-call verification policy.

/// Action label asserted when the caller does not name one.
pub const DEFAULT_EXPECTED_ACTION: &str = "general";

/// Score threshold applied when the caller does not set one.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Tunables the calling endpoint chooses for a single admission decision.
///
/// The gate itself never mutates a policy; endpoints construct one per call
/// site (a login route may demand a higher score than a newsletter signup)
/// and hand it in alongside the request context.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationPolicy {
    expected_action: String,
    min_score: f64,
    required: bool,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            expected_action: DEFAULT_EXPECTED_ACTION.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            required: true,
        }
    }
}

impl VerificationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action label the score verifier must echo back for the token to count.
    pub fn with_expected_action(mut self, action: impl Into<String>) -> Self {
        self.expected_action = action.into();
        self
    }

    /// Minimum acceptable score. Clamped to `[0.0, 1.0]`; non-finite values
    /// leave the threshold unchanged.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        if min_score.is_finite() {
            self.min_score = min_score.clamp(0.0, 1.0);
        }
        self
    }

    /// When `false`, a request with no token at all is admitted instead of
    /// denied. Tokens that are present are still verified in full.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn expected_action(&self) -> &str {
        &self.expected_action
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn required(&self) -> bool {
        self.required
    }
}
