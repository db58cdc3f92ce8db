//! Machine-readable denial codes and their HTTP status mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every way the gate can say no, as a closed set of wire codes.
///
/// Codes serialize as their SCREAMING_SNAKE_CASE wire form, which is also
/// what [`ErrorCode::as_str`] returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Proof supplied but no relay identity is configured on this deployment.
    PatNotConfigured,
    /// The relay was consulted with no token to check.
    PatTokenMissing,
    /// The relay examined the proof and turned it down.
    PatRejected,
    /// The relay answered with a non-success HTTP status.
    PatHttpError,
    /// The relay did not answer within the deadline.
    PatTimeout,
    /// The relay could not be reached at all.
    PatRequestFailed,
    /// Verification is required and the request carried no token of any kind.
    MissingHumanToken,
    /// The score verifier assessed the token and rejected it.
    RecaptchaFailed,
    /// Challenge token supplied but no scoring secret is configured.
    RecaptchaNotConfigured,
    /// The scoring service answered with a non-success HTTP status.
    RecaptchaHttpError,
    /// The scoring service did not answer within the deadline.
    RecaptchaTimeout,
    /// The scoring service could not be reached at all.
    RecaptchaRequestFailed,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatNotConfigured => "PAT_NOT_CONFIGURED",
            Self::PatTokenMissing => "PAT_TOKEN_MISSING",
            Self::PatRejected => "PAT_REJECTED",
            Self::PatHttpError => "PAT_HTTP_ERROR",
            Self::PatTimeout => "PAT_TIMEOUT",
            Self::PatRequestFailed => "PAT_REQUEST_FAILED",
            Self::MissingHumanToken => "MISSING_HUMAN_TOKEN",
            Self::RecaptchaFailed => "RECAPTCHA_FAILED",
            Self::RecaptchaNotConfigured => "RECAPTCHA_NOT_CONFIGURED",
            Self::RecaptchaHttpError => "RECAPTCHA_HTTP_ERROR",
            Self::RecaptchaTimeout => "RECAPTCHA_TIMEOUT",
            Self::RecaptchaRequestFailed => "RECAPTCHA_REQUEST_FAILED",
        }
    }

    /// The status the gate answers with when the upstream did not supply one.
    pub fn default_status(&self) -> u16 {
        match self {
            Self::PatTokenMissing
            | Self::PatRejected
            | Self::MissingHumanToken
            | Self::RecaptchaFailed => 400,
            Self::PatRequestFailed | Self::RecaptchaRequestFailed => 502,
            Self::PatNotConfigured | Self::RecaptchaNotConfigured => 503,
            Self::PatTimeout | Self::RecaptchaTimeout => 504,
            Self::PatHttpError | Self::RecaptchaHttpError => 502,
        }
    }

    /// Whether a denial with this code is ordinary client traffic (4xx)
    /// rather than an operational fault (5xx).
    pub fn is_client_error(&self) -> bool {
        self.default_status() < 500
    }

    /// All codes, for table-driven tests and exposition.
    pub const ALL: [ErrorCode; 12] = [
        Self::PatNotConfigured,
        Self::PatTokenMissing,
        Self::PatRejected,
        Self::PatHttpError,
        Self::PatTimeout,
        Self::PatRequestFailed,
        Self::MissingHumanToken,
        Self::RecaptchaFailed,
        Self::RecaptchaNotConfigured,
        Self::RecaptchaHttpError,
        Self::RecaptchaTimeout,
        Self::RecaptchaRequestFailed,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_matches_serde() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn status_mapping() {
        use ErrorCode::*;
        assert_eq!(PatTokenMissing.default_status(), 400);
        assert_eq!(PatRejected.default_status(), 400);
        assert_eq!(MissingHumanToken.default_status(), 400);
        assert_eq!(RecaptchaFailed.default_status(), 400);
        assert_eq!(PatRequestFailed.default_status(), 502);
        assert_eq!(RecaptchaRequestFailed.default_status(), 502);
        assert_eq!(PatHttpError.default_status(), 502);
        assert_eq!(RecaptchaHttpError.default_status(), 502);
        assert_eq!(PatNotConfigured.default_status(), 503);
        assert_eq!(RecaptchaNotConfigured.default_status(), 503);
        assert_eq!(PatTimeout.default_status(), 504);
        assert_eq!(RecaptchaTimeout.default_status(), 504);
    }

    #[test]
    fn client_class_is_the_4xx_set() {
        for code in ErrorCode::ALL {
            assert_eq!(code.is_client_error(), code.default_status() < 500);
        }
    }
}
