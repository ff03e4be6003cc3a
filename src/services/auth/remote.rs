//! Remote validation authority client.
//!
//! Forwards the bearer token to `<authServiceUrl>/validate` and relays the
//! boolean verdict. Dependency failures (timeout, connection, non-2xx,
//! malformed body) are reported as [`RemoteCallError`] and never collapsed
//! into an invalid-token verdict.
//!
//! No retries and no verdict caching at this layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use thiserror::Error;
use url::Url;

use crate::services::auth::bearer::{self, BearerToken};
use crate::services::auth::verifier::{TokenVerifier, Verdict, VerifierError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const VALIDATE_PATH: &str = "/validate";

#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("remote validation timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote validation transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("remote validation returned HTTP {0}")]
    Status(u16),
    #[error("remote validation returned a non-boolean body")]
    MalformedBody(#[source] serde_json::Error),
    #[error("invalid remote validation endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl RemoteCallError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[derive(Clone, Debug)]
pub struct RemoteVerifier {
    http_client: reqwest::Client,
    validate_url: Url,
    timeout: Duration,
}

impl RemoteVerifier {
    /// Builds a client whose every call is bounded by `timeout`.
    pub fn new(authority: &Url, timeout: Duration) -> Result<Self, RemoteCallError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteCallError::Transport)?;

        Self::with_client(http_client, authority, timeout)
    }

    /// `http_client` should already carry `timeout`; it is only used here for error reporting.
    pub fn with_client(
        http_client: reqwest::Client,
        authority: &Url,
        timeout: Duration,
    ) -> Result<Self, RemoteCallError> {
        Ok(Self {
            http_client,
            validate_url: validate_url(authority)?,
            timeout,
        })
    }

    pub fn validate_url(&self) -> &Url {
        &self.validate_url
    }

    pub async fn verify_remote(&self, token: &str) -> Result<Verdict, RemoteCallError> {
        let response = self
            .http_client
            .get(self.validate_url.clone())
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteCallError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let valid: bool = serde_json::from_slice(&body).map_err(RemoteCallError::MalformedBody)?;

        tracing::debug!(
            token = %bearer::fingerprint(token),
            valid,
            "remote validation answered"
        );

        Ok(Verdict::from(valid))
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteCallError {
        if err.is_timeout() {
            RemoteCallError::Timeout(self.timeout)
        } else {
            RemoteCallError::Transport(err)
        }
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    fn strategy(&self) -> &'static str {
        "remote"
    }

    async fn verify(&self, token: &BearerToken) -> Result<Verdict, VerifierError> {
        Ok(self.verify_remote(token.as_str()).await?)
    }
}

/// `authority + "/validate"`, tolerating a trailing slash on the authority.
fn validate_url(authority: &Url) -> Result<Url, url::ParseError> {
    let base = authority.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}{VALIDATE_PATH}"))
}
