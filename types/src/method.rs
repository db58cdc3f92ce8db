//! Admission method labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which strategy produced an admission decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMethod {
    /// Verification switched off by an environment toggle.
    Bypass,
    /// A Private Access Token proof was accepted by the relay.
    PrivateAccessToken,
    /// A challenge token cleared the score assessment.
    Recaptcha,
    /// No strategy ran to completion: either an optional-mode admission with
    /// no token, or a denial issued before any verifier answered.
    None,
}

impl AdmissionMethod {
    /// Stable label used in log fields and metric names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::PrivateAccessToken => "private_access_token",
            Self::Recaptcha => "recaptcha",
            Self::None => "none",
        }
    }
}

impl fmt::Display for AdmissionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
