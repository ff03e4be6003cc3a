/*
 * Responsibility
 * - Verdict (valid / invalid, no reason codes)
 * - TokenVerifier: the one capability the decision service depends on
 *   - local (LocalVerifier) / remote (RemoteVerifier), chosen once at startup
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::bearer::BearerToken;
use crate::services::auth::remote::RemoteCallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<bool> for Verdict {
    fn from(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }
}

/// A verifier could not reach a verdict. Never used for a bad token.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error(transparent)]
    Remote(#[from] RemoteCallError),
}

impl VerifierError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Remote(err) => err.is_timeout(),
        }
    }
}

/// `Err` is reserved for dependency failures;
/// a bad token is always `Ok(Verdict::Invalid)`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Short strategy name for logs.
    fn strategy(&self) -> &'static str;

    async fn verify(&self, token: &BearerToken) -> Result<Verdict, VerifierError>;
}
