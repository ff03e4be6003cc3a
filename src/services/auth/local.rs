/*
 * Responsibility
 * - JWT access token をローカル鍵 (SigningKeySet) で検証する
 *   - signature / exp / nbf (leeway 付き), 設定されていれば iss / aud
 * - verify_local: bool 相当の Verdict のみ返す (失敗理由は debug log のみ)
 * - decode: /authenticate 用に claims を返す
 */
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::services::auth::bearer::{self, BearerToken};
use crate::services::auth::keys::SigningKeySet;
use crate::services::auth::verifier::{TokenVerifier, Verdict, VerifierError};

pub const DEFAULT_LEEWAY_SECONDS: u64 = 60;

// Internal only. Callers of `verify_local` never see which of these happened.
#[derive(Debug, Error)]
pub enum LocalVerifyError {
    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("no trusted key for alg={alg:?} kid={kid:?}")]
    NoCandidateKey {
        alg: Algorithm,
        kid: Option<String>,
    },
    #[error("token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Access token (JWT) claims.
///
/// `exp` is mandatory. `aud` can be a string or an array, so it stays a `Value`;
/// `Validation::set_audience` does the actual check when an audience is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: serde_json::Value,

    pub exp: u64,

    #[serde(default)]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub jti: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,
}

/// Offline verifier: signature + structure + temporal claims against a [`SigningKeySet`].
#[derive(Clone, Debug)]
pub struct LocalVerifier {
    keys: Arc<SigningKeySet>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway_seconds: u64,
}

impl LocalVerifier {
    pub fn new(keys: Arc<SigningKeySet>) -> Self {
        Self {
            keys,
            issuer: None,
            audience: None,
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    #[must_use]
    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.leeway_seconds = leeway_seconds;
        self
    }

    /// Fail-closed verdict. Never errors, whatever the input.
    pub fn verify_local(&self, token: &str) -> Verdict {
        match self.decode(token) {
            Ok(_) => Verdict::Valid,
            Err(err) => {
                tracing::debug!(
                    token = %bearer::fingerprint(token),
                    error = %err,
                    "local token verification failed"
                );
                Verdict::Invalid
            }
        }
    }

    /// Verify and return the claims.
    ///
    /// `jsonwebtoken::decode` checks the signature, `exp` (required) and `nbf`,
    /// plus `iss` / `aud` when they are configured.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, LocalVerifyError> {
        let header = jsonwebtoken::decode_header(token).map_err(LocalVerifyError::Malformed)?;
        let validation = self.validation(header.alg);

        let mut last_err = None;
        for key in self.keys.candidates(header.kid.as_deref(), header.alg) {
            match jsonwebtoken::decode::<TokenClaims>(token, key.decoding_key(), &validation) {
                Ok(data) => return Ok(data.claims),
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(err) => LocalVerifyError::Rejected(err),
            None => LocalVerifyError::NoCandidateKey {
                alg: header.alg,
                kid: header.kid,
            },
        })
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        validation
    }
}

#[async_trait]
impl TokenVerifier for LocalVerifier {
    fn strategy(&self) -> &'static str {
        "local"
    }

    async fn verify(&self, token: &BearerToken) -> Result<Verdict, VerifierError> {
        Ok(self.verify_local(token.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::testutil::{
        ED25519_OTHER_PRIVATE_PEM, ED25519_PRIVATE_PEM, ED25519_PUBLIC_PEM, HMAC_SECRET,
        TestClaims, hs256_verifier, mint_ed25519, mint_hs256, now, tamper_signature,
    };

    #[test]
    fn accepts_valid_token() {
        let verifier = hs256_verifier();
        let token = mint_hs256(&TestClaims::valid("alice"));

        assert_eq!(verifier.verify_local(&token), Verdict::Valid);
        let claims = verifier.decode(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("alice"));
    }

    #[test]
    fn rejects_any_flipped_signature_byte() {
        let verifier = hs256_verifier();
        let token = mint_hs256(&TestClaims::valid("alice"));

        for index in [0, 7, 31] {
            let forged = tamper_signature(&token, index);
            assert_ne!(forged, token);
            assert_eq!(verifier.verify_local(&forged), Verdict::Invalid);
        }
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = hs256_verifier();
        let mut claims = TestClaims::valid("alice");
        claims.exp = now() - 3600;

        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Invalid);
    }

    #[test]
    fn leeway_tolerates_small_clock_skew() {
        let verifier = hs256_verifier().with_leeway(120);
        let mut claims = TestClaims::valid("alice");
        claims.exp = now() - 30;

        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Valid);
        assert_eq!(
            verifier.with_leeway(0).verify_local(&mint_hs256(&claims)),
            Verdict::Invalid
        );
    }

    #[test]
    fn rejects_token_not_yet_valid() {
        let verifier = hs256_verifier();
        let mut claims = TestClaims::valid("alice");
        claims.nbf = Some(now() + 3600);

        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Invalid);
    }

    #[test]
    fn garbage_never_panics() {
        let verifier = hs256_verifier();
        let inputs = [
            "",
            "garbage",
            "a.b",
            "a.b.c",
            "a.b.c.d",
            "....",
            "eyJhbGciOiJub25lIn0.e30.",
            "\u{0}\u{1}",
            "ünïcödé.ünïcödé.ünïcödé",
        ];

        for input in inputs {
            assert_eq!(verifier.verify_local(input), Verdict::Invalid, "{input:?}");
        }
    }

    #[test]
    fn rejects_token_without_exp() {
        let verifier = hs256_verifier();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "alice" }),
            &EncodingKey::from_secret(HMAC_SECRET),
        )
        .unwrap();

        assert_eq!(verifier.verify_local(&token), Verdict::Invalid);
    }

    #[test]
    fn rejects_token_signed_with_another_secret() {
        let verifier = hs256_verifier();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &TestClaims::valid("alice"),
            &EncodingKey::from_secret(b"someone-else"),
        )
        .unwrap();

        assert_eq!(verifier.verify_local(&token), Verdict::Invalid);
    }

    #[test]
    fn checks_issuer_and_audience_when_configured() {
        let verifier = hs256_verifier()
            .with_issuer(Some("https://issuer.test".into()))
            .with_audience(Some("gateway".into()));

        let mut claims = TestClaims::valid("alice");
        claims.iss = Some("https://issuer.test".into());
        claims.aud = Some("gateway".into());
        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Valid);

        claims.iss = Some("https://evil.test".into());
        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Invalid);

        claims.iss = Some("https://issuer.test".into());
        claims.aud = Some("someone-else".into());
        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Invalid);
    }

    #[test]
    fn audience_is_ignored_when_not_configured() {
        let verifier = hs256_verifier();
        let mut claims = TestClaims::valid("alice");
        claims.aud = Some("anything".into());

        assert_eq!(verifier.verify_local(&mint_hs256(&claims)), Verdict::Valid);
    }

    #[test]
    fn verifies_ed25519_tokens() {
        let keys = SigningKeySet::from_public_pem(ED25519_PUBLIC_PEM).unwrap();
        let verifier = LocalVerifier::new(Arc::new(keys));

        let token = mint_ed25519(ED25519_PRIVATE_PEM, None, &TestClaims::valid("bob"));
        assert_eq!(verifier.verify_local(&token), Verdict::Valid);

        let foreign = mint_ed25519(ED25519_OTHER_PRIVATE_PEM, None, &TestClaims::valid("bob"));
        assert_eq!(verifier.verify_local(&foreign), Verdict::Invalid);
    }

    #[test]
    fn algorithm_not_backed_by_a_key_is_rejected() {
        // HS256 token against an Ed25519-only key set
        let keys = SigningKeySet::from_public_pem(ED25519_PUBLIC_PEM).unwrap();
        let verifier = LocalVerifier::new(Arc::new(keys));
        let token = mint_hs256(&TestClaims::valid("alice"));

        assert!(matches!(
            verifier.decode(&token),
            Err(LocalVerifyError::NoCandidateKey { alg: Algorithm::HS256, .. })
        ));
        assert_eq!(verifier.verify_local(&token), Verdict::Invalid);
    }

    #[test]
    fn selects_key_by_kid() {
        let mut keys = SigningKeySet::from_public_pem(ED25519_PUBLIC_PEM).unwrap();
        keys.extend(SigningKeySet::from_secret(HMAC_SECRET).unwrap());
        let verifier = LocalVerifier::new(Arc::new(keys));

        let token = mint_ed25519(ED25519_PRIVATE_PEM, Some("rotating-1"), &TestClaims::valid("bob"));
        assert_eq!(verifier.verify_local(&token), Verdict::Valid);
    }

    #[tokio::test]
    async fn implements_token_verifier() {
        let verifier = hs256_verifier();
        let header = format!("Bearer {}", mint_hs256(&TestClaims::valid("alice")));
        let token = bearer::extract(Some(&header)).unwrap();

        assert_eq!(verifier.strategy(), "local");
        assert_eq!(verifier.verify(&token).await.unwrap(), Verdict::Valid);
    }
}
