//! Gate-level configuration: the bypass switches.

/// Immutable gate settings, built once at startup.
///
/// Bypass exists so test suites and local development are not blocked by
/// live third-party services. It is all-or-nothing: when any switch is set,
/// every request is admitted without consulting a verifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateConfig {
    bypass: bool,
    bypass_source: Option<&'static str>,
}

impl GateConfig {
    /// Read the bypass switches from the process environment.
    ///
    /// Any one of `NODE_ENV=test`, `HUMAN_VERIFICATION_BYPASS` truthy, or
    /// `RECAPTCHA_TEST_BYPASS` truthy enables bypass.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GateConfig::from_env`] but with an injectable variable
    /// source, so construction can be exercised without touching process
    /// state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let node_env_test = lookup("NODE_ENV")
            .map(|v| v.trim() == "test")
            .unwrap_or(false);
        if node_env_test {
            return Self {
                bypass: true,
                bypass_source: Some("NODE_ENV"),
            };
        }
        for key in ["HUMAN_VERIFICATION_BYPASS", "RECAPTCHA_TEST_BYPASS"] {
            if lookup(key).as_deref().map(truthy).unwrap_or(false) {
                return Self {
                    bypass: true,
                    bypass_source: Some(key),
                };
            }
        }
        Self::default()
    }

    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self.bypass_source = bypass.then_some("override");
        self
    }

    pub fn bypass(&self) -> bool {
        self.bypass
    }

    /// Which switch enabled bypass, for the admission log line.
    pub fn bypass_source(&self) -> Option<&'static str> {
        self.bypass_source
    }
}

/// `1` and `true` (any casing) count as set; everything else does not.
fn truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
