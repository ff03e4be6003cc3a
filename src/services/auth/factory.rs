/// Factory: build verifiers from application `Config` (startup only).
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::config::{Config, KeySources, VerifierKind};
use crate::services::auth::{LocalVerifier, RemoteVerifier, SigningKeySet, TokenVerifier};

/// Merge every configured key source. `None` when no source is configured.
pub fn build_signing_keys(sources: &KeySources) -> Result<Option<SigningKeySet>> {
    if sources.is_empty() {
        return Ok(None);
    }

    let mut keys = SigningKeySet::default();

    if let Some(pem) = &sources.public_key_pem {
        keys.extend(
            SigningKeySet::from_public_pem(pem).context("ACCESS_JWT_PUBLIC_KEY_PEM")?,
        );
    }
    if let Some(json) = &sources.jwks_json {
        keys.extend(SigningKeySet::from_jwks_json(json).context("AUTH_JWKS")?);
    }
    if let Some(path) = &sources.jwks_path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read AUTH_JWKS_PATH={path}"))?;
        keys.extend(
            SigningKeySet::from_jwks_json(&json)
                .with_context(|| format!("AUTH_JWKS_PATH={path}"))?,
        );
    }
    if let Some(secret) = &sources.hmac_secret {
        keys.extend(SigningKeySet::from_secret(secret.as_bytes()).context("AUTH_HMAC_SECRET")?);
    }

    tracing::info!(keys = keys.len(), "loaded signing key set");
    Ok(Some(keys))
}

pub fn build_local_verifier(config: &Config) -> Result<Option<Arc<LocalVerifier>>> {
    let Some(keys) = build_signing_keys(&config.key_sources)? else {
        return Ok(None);
    };

    let verifier = LocalVerifier::new(Arc::new(keys))
        .with_issuer(config.auth_issuer.clone())
        .with_audience(config.auth_audience.clone())
        .with_leeway(config.access_token_leeway_seconds);

    Ok(Some(Arc::new(verifier)))
}

/// Pick the `/auth/validate` strategy. Decided once, here.
pub fn build_verifier(
    config: &Config,
    local: Option<Arc<LocalVerifier>>,
) -> Result<Arc<dyn TokenVerifier>> {
    match config.verifier {
        VerifierKind::Local => match local {
            Some(local) => Ok(local as Arc<dyn TokenVerifier>),
            None => bail!("AUTH_VERIFIER=local requires a signing key source"),
        },
        VerifierKind::Remote => {
            let authority = config
                .auth_service_url
                .as_ref()
                .context("AUTH_VERIFIER=remote requires AUTH_SERVICE_URL")?;
            let remote = RemoteVerifier::new(authority, config.auth_service_timeout)
                .context("failed to build remote validation client")?;

            tracing::info!(
                url = %remote.validate_url(),
                timeout = ?config.auth_service_timeout,
                "using remote token validation"
            );
            Ok(Arc::new(remote) as Arc<dyn TokenVerifier>)
        }
    }
}
