use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

use super::AuthCtx;

/// Handler で AuthCtx を受け取るための extractor
///
/// Never rejects: a missing context is handed to the handler as `None`, and the
/// authentication delegate decides what that means (contract violation).
pub struct AuthCtxExtractor(pub Option<AuthCtx>);

impl FromRequestParts<AppState> for AuthCtxExtractor
where
    AppState: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuthCtxExtractor(parts.extensions.get::<AuthCtx>().cloned()))
    }
}
