/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - validation: 設定で選ばれた verifier を持つ ValidationService
 *   - identity: /authenticate の identity middleware が使う LocalVerifier (鍵が無ければ None)
 *   - delegate: AuthenticationDelegate
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::auth::{AuthenticationDelegate, LocalVerifier, ValidationService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub validation: Arc<ValidationService>,
    pub identity: Option<Arc<LocalVerifier>>,
    pub delegate: Arc<AuthenticationDelegate>,
}

impl AppState {
    pub fn new(
        validation: Arc<ValidationService>,
        identity: Option<Arc<LocalVerifier>>,
        delegate: Arc<AuthenticationDelegate>,
    ) -> Self {
        Self {
            validation,
            identity,
            delegate,
        }
    }
}
