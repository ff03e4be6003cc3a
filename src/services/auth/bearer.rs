/*
 * Responsibility
 * - Authorization header -> BearerToken
 * - Missing / non-Bearer / empty credentials are expected outcomes (-> 401), not faults
 */
use std::fmt;

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Case-sensitive, single space.
pub const BEARER_PREFIX: &str = "Bearer ";

const FINGERPRINT_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header is not a bearer credential")]
    NotBearer,
    #[error("bearer credential is empty")]
    Empty,
}

/// Raw bearer credential with the `"Bearer "` prefix already stripped.
///
/// Never empty. `Debug` is redacted; use [`BearerToken::fingerprint`] in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, non-reversible identifier for log correlation.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken")
            .field(&format_args!("sha256:{}", self.fingerprint()))
            .finish()
    }
}

impl AsRef<str> for BearerToken {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

pub fn extract(header_value: Option<&str>) -> Result<BearerToken, ExtractionFailure> {
    let value = header_value.ok_or(ExtractionFailure::Missing)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(ExtractionFailure::NotBearer)?;

    if token.is_empty() {
        return Err(ExtractionFailure::Empty);
    }

    Ok(BearerToken(token.to_string()))
}

/// Same as [`extract`], reading `Authorization` from a header map.
/// A value that is not visible ASCII can't be a bearer credential.
pub fn extract_from_headers(headers: &HeaderMap) -> Result<BearerToken, ExtractionFailure> {
    match headers.get(header::AUTHORIZATION) {
        None => Err(ExtractionFailure::Missing),
        Some(value) => {
            let value = value.to_str().map_err(|_| ExtractionFailure::NotBearer)?;
            extract(Some(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn extracts_token_after_prefix() {
        let token = extract(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token.as_str(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_a_failure() {
        assert_eq!(extract(None), Err(ExtractionFailure::Missing));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(extract(Some("Basic xyz")), Err(ExtractionFailure::NotBearer));
        assert_eq!(extract(Some("bearer abc")), Err(ExtractionFailure::NotBearer));
        assert_eq!(extract(Some("Bearer")), Err(ExtractionFailure::NotBearer));
        assert_eq!(extract(Some("")), Err(ExtractionFailure::NotBearer));
    }

    #[test]
    fn prefix_without_token_is_empty() {
        assert_eq!(extract(Some("Bearer ")), Err(ExtractionFailure::Empty));
    }

    #[test]
    fn only_the_first_space_is_consumed() {
        let token = extract(Some("Bearer  abc")).unwrap();
        assert_eq!(token.as_str(), " abc");
    }

    #[test]
    fn reads_authorization_from_header_map() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_from_headers(&headers),
            Err(ExtractionFailure::Missing)
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));
        assert_eq!(extract_from_headers(&headers).unwrap().as_str(), "t0k");

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(
            extract_from_headers(&headers),
            Err(ExtractionFailure::NotBearer)
        );
    }

    #[test]
    fn debug_does_not_leak_the_token() {
        let token = extract(Some("Bearer super-secret-value")).unwrap();
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains(&token.fingerprint()));
        assert_eq!(token.fingerprint().len(), FINGERPRINT_LEN);
    }
}
