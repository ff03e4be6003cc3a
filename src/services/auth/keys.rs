//! Trusted verification keys (SigningKeySet).
//!
//! Loaded once at startup and shared read-only through `Arc`.
//! Rotation is owned by whoever publishes the key material; this process only reads it.
//!
//! Sources:
//! - a single public key PEM (Ed25519, RSA or EC, detected in that order)
//! - a JWKS document (`{"keys": [...]}`), encryption keys are skipped
//! - a shared HMAC secret (HS256/384/512)

use std::fmt;

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;

const RSA_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];
const HMAC_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("public key pem is not an Ed25519, RSA or EC public key")]
    UnsupportedPem,
    #[error("invalid jwks document: {0}")]
    InvalidJwks(#[from] serde_json::Error),
    #[error("jwks contains no usable signing keys")]
    NoSigningKeys,
    #[error("hmac secret is empty")]
    EmptySecret,
}

/// One trusted key and the JWS algorithms it may verify.
#[derive(Clone)]
pub struct SigningKey {
    kid: Option<String>,
    algorithms: Vec<Algorithm>,
    key: DecodingKey,
}

impl SigningKey {
    pub fn new(kid: Option<String>, algorithms: Vec<Algorithm>, key: DecodingKey) -> Self {
        Self {
            kid,
            algorithms,
            key,
        }
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub fn permits(&self, alg: Algorithm) -> bool {
        self.algorithms.contains(&alg)
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithms", &self.algorithms)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SigningKeySet {
    keys: Vec<SigningKey>,
}

impl SigningKeySet {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }

    pub fn from_public_pem(pem: &str) -> Result<Self, KeySetError> {
        let pem = pem.as_bytes();

        let key = if let Ok(key) = DecodingKey::from_ed_pem(pem) {
            SigningKey::new(None, vec![Algorithm::EdDSA], key)
        } else if let Ok(key) = DecodingKey::from_rsa_pem(pem) {
            SigningKey::new(None, RSA_ALGORITHMS.to_vec(), key)
        } else if let Ok(key) = DecodingKey::from_ec_pem(pem) {
            SigningKey::new(None, vec![Algorithm::ES256, Algorithm::ES384], key)
        } else {
            return Err(KeySetError::UnsupportedPem);
        };

        Ok(Self::new(vec![key]))
    }

    pub fn from_jwks_json(json: &str) -> Result<Self, KeySetError> {
        let jwks: JwkSet = serde_json::from_str(json)?;

        let keys: Vec<SigningKey> = jwks
            .keys
            .iter()
            .filter(|jwk| !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)))
            .filter_map(|jwk| {
                let algorithms = jwk_algorithms(jwk);
                if algorithms.is_empty() {
                    tracing::debug!(kid = ?jwk.common.key_id, "skipping jwk without a signing algorithm");
                    return None;
                }
                match DecodingKey::from_jwk(jwk) {
                    Ok(key) => Some(SigningKey::new(jwk.common.key_id.clone(), algorithms, key)),
                    Err(err) => {
                        tracing::warn!(kid = ?jwk.common.key_id, error = %err, "skipping unusable jwk");
                        None
                    }
                }
            })
            .collect();

        if keys.is_empty() {
            return Err(KeySetError::NoSigningKeys);
        }

        Ok(Self::new(keys))
    }

    pub fn from_secret(secret: &[u8]) -> Result<Self, KeySetError> {
        if secret.is_empty() {
            return Err(KeySetError::EmptySecret);
        }

        Ok(Self::new(vec![SigningKey::new(
            None,
            HMAC_ALGORITHMS.to_vec(),
            DecodingKey::from_secret(secret),
        )]))
    }

    pub fn extend(&mut self, other: SigningKeySet) {
        self.keys.extend(other.keys);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys that may have signed a token with this `kid` / `alg`.
    ///
    /// A token `kid` matches keys with the same id or keys published without one.
    pub fn candidates<'a>(
        &'a self,
        kid: Option<&'a str>,
        alg: Algorithm,
    ) -> impl Iterator<Item = &'a SigningKey> + 'a {
        self.keys.iter().filter(move |key| {
            let kid_matches = match (kid, key.kid()) {
                (Some(wanted), Some(have)) => wanted == have,
                _ => true,
            };
            kid_matches && key.permits(alg)
        })
    }
}

fn jwk_algorithms(jwk: &Jwk) -> Vec<Algorithm> {
    if let Some(alg) = &jwk.common.key_algorithm {
        return match alg {
            KeyAlgorithm::HS256 => vec![Algorithm::HS256],
            KeyAlgorithm::HS384 => vec![Algorithm::HS384],
            KeyAlgorithm::HS512 => vec![Algorithm::HS512],
            KeyAlgorithm::ES256 => vec![Algorithm::ES256],
            KeyAlgorithm::ES384 => vec![Algorithm::ES384],
            KeyAlgorithm::RS256 => vec![Algorithm::RS256],
            KeyAlgorithm::RS384 => vec![Algorithm::RS384],
            KeyAlgorithm::RS512 => vec![Algorithm::RS512],
            KeyAlgorithm::PS256 => vec![Algorithm::PS256],
            KeyAlgorithm::PS384 => vec![Algorithm::PS384],
            KeyAlgorithm::PS512 => vec![Algorithm::PS512],
            KeyAlgorithm::EdDSA => vec![Algorithm::EdDSA],
            // key-management algorithms (RSA1_5, RSA-OAEP, ...)
            _ => Vec::new(),
        };
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => RSA_ALGORITHMS.to_vec(),
        AlgorithmParameters::EllipticCurve(params) => match params.curve {
            EllipticCurve::P256 => vec![Algorithm::ES256],
            EllipticCurve::P384 => vec![Algorithm::ES384],
            _ => Vec::new(),
        },
        AlgorithmParameters::OctetKeyPair(params) => match params.curve {
            EllipticCurve::Ed25519 => vec![Algorithm::EdDSA],
            _ => Vec::new(),
        },
        AlgorithmParameters::OctetKey(_) => HMAC_ALGORITHMS.to_vec(),
    }
}
