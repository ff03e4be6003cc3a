/*
 * Responsibility
 * - POST /authenticate
 * - identity middleware が入れた AuthCtx を delegate に渡し、結果文字列を返す
 */
use axum::extract::State;

use crate::api::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::state::AppState;

pub async fn authenticate(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<String, AppError> {
    let result = state.delegate.authenticate(ctx.as_ref())?;
    Ok(result)
}
