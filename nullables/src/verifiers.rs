//! Scripted verifiers that record calls instead of making them.

use async_trait::async_trait;
use portcullis_types::{PatVerdict, PatVerify, Rejection, ScoreVerdict, ScoreVerify};
use std::sync::{Arc, Mutex, MutexGuard};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One recorded call to a [`NullPatVerifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatCall {
    pub token: String,
    pub remote_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A Private Access Token verifier that answers with a programmed verdict.
///
/// Clones share the call log, so a test can hand one clone to the gate and
/// keep another for assertions.
#[derive(Clone)]
pub struct NullPatVerifier {
    verdict: PatVerdict,
    calls: Arc<Mutex<Vec<PatCall>>>,
}

impl NullPatVerifier {
    pub fn with_verdict(verdict: PatVerdict) -> Self {
        Self {
            verdict,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accepts every token.
    pub fn accepting() -> Self {
        Self::with_verdict(PatVerdict::Accepted {
            status: 200,
            details: None,
        })
    }

    /// Rejects every token with the given rejection.
    pub fn rejecting(rejection: Rejection) -> Self {
        Self::with_verdict(PatVerdict::Rejected(rejection))
    }

    /// Reports a deployment with no relay identity.
    pub fn not_configured() -> Self {
        Self::with_verdict(PatVerdict::NotConfigured)
    }

    /// All calls made so far (for assertions).
    pub fn calls(&self) -> Vec<PatCall> {
        locked(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }
}

#[async_trait]
impl PatVerify for NullPatVerifier {
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> PatVerdict {
        locked(&self.calls).push(PatCall {
            token: token.to_string(),
            remote_ip: remote_ip.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
        });
        self.verdict.clone()
    }
}

/// One recorded call to a [`NullScoreVerifier`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreCall {
    pub token: String,
    pub expected_action: String,
    pub min_score: f64,
    pub remote_ip: Option<String>,
}

/// A score verifier that answers with a programmed verdict.
#[derive(Clone)]
pub struct NullScoreVerifier {
    verdict: ScoreVerdict,
    calls: Arc<Mutex<Vec<ScoreCall>>>,
}

impl NullScoreVerifier {
    pub fn with_verdict(verdict: ScoreVerdict) -> Self {
        Self {
            verdict,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accepts every token with the given score and action.
    pub fn accepting(score: f64, action: impl Into<String>) -> Self {
        Self::with_verdict(ScoreVerdict::Accepted {
            score,
            action: action.into(),
        })
    }

    /// Rejects every token with the given rejection.
    pub fn rejecting(rejection: Rejection) -> Self {
        Self::with_verdict(ScoreVerdict::Rejected(rejection))
    }

    /// Reports a deployment with no scoring secret.
    pub fn not_configured() -> Self {
        Self::with_verdict(ScoreVerdict::NotConfigured)
    }

    /// All calls made so far (for assertions).
    pub fn calls(&self) -> Vec<ScoreCall> {
        locked(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }
}

#[async_trait]
impl ScoreVerify for NullScoreVerifier {
    async fn verify(
        &self,
        token: &str,
        expected_action: &str,
        min_score: f64,
        remote_ip: Option<&str>,
    ) -> ScoreVerdict {
        locked(&self.calls).push(ScoreCall {
            token: token.to_string(),
            expected_action: expected_action.to_string(),
            min_score,
            remote_ip: remote_ip.map(str::to_string),
        });
        self.verdict.clone()
    }
}
