/*
 * Responsibility
 * - POST /authenticate の中身: 検証済み AuthCtx -> 結果文字列
 * - No cryptographic verification here; the identity middleware already did it
 * - No context / unauthenticated context = caller contract violation (error, not `false`)
 */
use thiserror::Error;

use crate::api::extractors::AuthCtx;

pub const DEFAULT_TEMPLATE: &str = "{sub}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("no authentication context was established for this request")]
    MissingContext,
    #[error("authentication context is not authenticated")]
    Unauthenticated,
}

/// Derives the `/authenticate` result from the context using a template.
///
/// Placeholders: `{sub}`, `{scope}` (space separated), `{iss}`, `{jti}`, `{exp}` (RFC 3339).
/// Absent values render as an empty string.
#[derive(Debug, Clone)]
pub struct AuthenticationDelegate {
    template: String,
}

impl Default for AuthenticationDelegate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl AuthenticationDelegate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn authenticate(&self, ctx: Option<&AuthCtx>) -> Result<String, ContractViolation> {
        let ctx = ctx.ok_or(ContractViolation::MissingContext)?;
        if !ctx.is_authenticated() {
            return Err(ContractViolation::Unauthenticated);
        }

        Ok(self.render(ctx))
    }

    fn render(&self, ctx: &AuthCtx) -> String {
        let expires_at = ctx
            .expires_at
            .map(|exp| exp.to_rfc3339())
            .unwrap_or_default();

        self.template
            .replace("{sub}", &ctx.subject)
            .replace("{scope}", &ctx.scopes.join(" "))
            .replace("{iss}", ctx.issuer.as_deref().unwrap_or_default())
            .replace("{jti}", ctx.jti.as_deref().unwrap_or_default())
            .replace("{exp}", &expires_at)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn ctx() -> AuthCtx {
        AuthCtx {
            subject: "alice".into(),
            scopes: vec!["read".into(), "write".into()],
            issuer: Some("https://issuer.test".into()),
            jti: None,
            expires_at: DateTime::from_timestamp(1_700_000_000, 0),
        }
    }

    #[test]
    fn default_template_is_the_subject() {
        let delegate = AuthenticationDelegate::default();
        assert_eq!(delegate.authenticate(Some(&ctx())).unwrap(), "alice");
    }

    #[test]
    fn renders_every_placeholder() {
        let delegate = AuthenticationDelegate::new("{sub}|{scope}|{iss}|{jti}|{exp}");
        assert_eq!(
            delegate.authenticate(Some(&ctx())).unwrap(),
            "alice|read write|https://issuer.test||2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn missing_context_is_a_contract_violation() {
        let delegate = AuthenticationDelegate::default();
        assert_eq!(
            delegate.authenticate(None),
            Err(ContractViolation::MissingContext)
        );
    }

    #[test]
    fn unauthenticated_context_is_a_contract_violation() {
        let delegate = AuthenticationDelegate::default();
        assert_eq!(
            delegate.authenticate(Some(&AuthCtx::new(""))),
            Err(ContractViolation::Unauthenticated)
        );
    }
}
