/*
 * Responsibility
 * - GET /auth/validate
 * - request headers をそのまま ValidationService に渡す (判定ロジックは置かない)
 */
use axum::{extract::State, http::HeaderMap};

use crate::services::auth::Decision;
use crate::state::AppState;

pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> Decision {
    state.validation.decide_headers(&headers).await
}
