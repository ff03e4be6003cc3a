/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型 (AuthenticationContext)
 * - identity middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 */
use chrono::{DateTime, Utc};

use crate::services::auth::local::TokenClaims;

/// Identity established upstream of the handler.
///
/// - `subject` is the token `sub`; blank means "not authenticated"
/// - `scopes` is the space-separated `scope` claim, split
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthCtx {
    pub subject: String,
    pub scopes: Vec<String>,
    pub issuer: Option<String>,
    pub jti: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthCtx {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    pub fn from_claims(claims: TokenClaims) -> Self {
        let scopes = claims
            .scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|exp| DateTime::from_timestamp(exp, 0));

        Self {
            subject: claims.sub.unwrap_or_default(),
            scopes,
            issuer: claims.iss,
            jti: claims.jti,
            expires_at,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.subject.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: Option<&str>, scope: Option<&str>) -> TokenClaims {
        serde_json::from_value(serde_json::json!({
            "sub": sub,
            "scope": scope,
            "iss": "https://issuer.test",
            "jti": "j-1",
            "exp": 1_700_000_000u64,
        }))
        .unwrap()
    }

    #[test]
    fn builds_from_claims() {
        let ctx = AuthCtx::from_claims(claims(Some("alice"), Some("read  write")));

        assert_eq!(ctx.subject, "alice");
        assert_eq!(ctx.scopes, vec!["read", "write"]);
        assert_eq!(ctx.issuer.as_deref(), Some("https://issuer.test"));
        assert_eq!(ctx.jti.as_deref(), Some("j-1"));
        assert_eq!(ctx.expires_at.unwrap().timestamp(), 1_700_000_000);
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn missing_subject_is_not_authenticated() {
        let ctx = AuthCtx::from_claims(claims(None, None));
        assert!(ctx.scopes.is_empty());
        assert!(!ctx.is_authenticated());
        assert!(!AuthCtx::new("   ").is_authenticated());
    }
}
