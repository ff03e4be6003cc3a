//! bearer JWT 検証 → AuthCtx を extensions に入れる (POST /authenticate 用)
//!
//! - `Authorization: Bearer <jwt>` をローカル鍵で検証し、claims から AuthCtx を作る
//! - 鍵が設定されていない (remote only) 場合は何もしない
//!   → handler 側で AuthCtx が無いので delegate が contract violation を返す

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::bearer;
use crate::state::AppState;

/// Attach the identity middleware to the routes of `router` only.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, identity_middleware))
}

async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(verifier) = state.identity.as_ref() else {
        return Ok(next.run(req).await);
    };

    let token = bearer::extract_from_headers(req.headers())?;

    let claims = match verifier.decode(token.as_str()) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                token = %token.fingerprint(),
                error = %err,
                "identity token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    let auth_ctx = AuthCtx::from_claims(claims);

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
