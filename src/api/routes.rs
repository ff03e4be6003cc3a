/*
 * Responsibility
 * - URL 構造を定義
 *   - GET /health, GET /auth/validate, POST /authenticate
 * - identity middleware は /authenticate にだけ route_layer で適用する
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{authenticate::authenticate, health::health, validate::validate};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let authenticate_routes = middleware::auth::identity::apply(
        Router::new().route("/authenticate", post(authenticate)),
        state,
    );

    Router::new()
        .route("/health", get(health))
        .route("/auth/validate", get(validate))
        .merge(authenticate_routes)
}
