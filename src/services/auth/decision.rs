/*
 * Responsibility
 * - Authorization header -> (HTTP status, bool)
 * - Extraction failure short-circuits: the verifier is never called
 * - Dependency failures stay distinguishable from invalid tokens (5xx, never 401)
 */
use std::{fmt, sync::Arc};

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::services::auth::bearer::{self, BearerToken, ExtractionFailure};
use crate::services::auth::verifier::{TokenVerifier, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub status: StatusCode,
    pub valid: bool,
}

impl Decision {
    pub const VALID: Self = Self {
        status: StatusCode::OK,
        valid: true,
    };
    pub const INVALID: Self = Self {
        status: StatusCode::UNAUTHORIZED,
        valid: false,
    };

    fn dependency_failure(status: StatusCode) -> Self {
        Self {
            status,
            valid: false,
        }
    }
}

impl IntoResponse for Decision {
    fn into_response(self) -> Response {
        (self.status, Json(self.valid)).into_response()
    }
}

#[derive(Clone)]
pub struct ValidationService {
    verifier: Arc<dyn TokenVerifier>,
}

impl fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationService")
            .field("strategy", &self.verifier.strategy())
            .finish()
    }
}

impl ValidationService {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    pub fn strategy(&self) -> &'static str {
        self.verifier.strategy()
    }

    pub async fn decide(&self, header_value: Option<&str>) -> Decision {
        self.decide_extracted(bearer::extract(header_value)).await
    }

    /// Same as [`ValidationService::decide`], reading `Authorization` from the request headers.
    pub async fn decide_headers(&self, headers: &HeaderMap) -> Decision {
        self.decide_extracted(bearer::extract_from_headers(headers)).await
    }

    async fn decide_extracted(&self, extracted: Result<BearerToken, ExtractionFailure>) -> Decision {
        let token = match extracted {
            Ok(token) => token,
            Err(reason) => {
                tracing::debug!(%reason, "no usable bearer credential");
                return Decision::INVALID;
            }
        };

        match self.verifier.verify(&token).await {
            Ok(Verdict::Valid) => Decision::VALID,
            Ok(Verdict::Invalid) => Decision::INVALID,
            Err(err) if err.is_timeout() => {
                tracing::warn!(
                    token = %token.fingerprint(),
                    strategy = self.verifier.strategy(),
                    error = %err,
                    "token validation dependency timed out"
                );
                Decision::dependency_failure(StatusCode::GATEWAY_TIMEOUT)
            }
            Err(err) => {
                tracing::error!(
                    token = %token.fingerprint(),
                    strategy = self.verifier.strategy(),
                    error = %err,
                    "token validation dependency failed"
                );
                Decision::dependency_failure(StatusCode::BAD_GATEWAY)
            }
        }
    }
}
