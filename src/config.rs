/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, verifier strategy, key sources, remote authority)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::auth::{delegate, local, remote};

/// Any one of these satisfies the local strategy.
const LOCAL_KEY_SOURCES: &str =
    "ACCESS_JWT_PUBLIC_KEY_PEM | AUTH_JWKS | AUTH_JWKS_PATH | AUTH_HMAC_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Which verifier answers `/auth/validate`. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierKind {
    Local,
    Remote,
}

impl FromStr for VerifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::Invalid("AUTH_VERIFIER")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where the trusted verification keys come from. Any combination may be set.
#[derive(Clone, Default)]
pub struct KeySources {
    pub public_key_pem: Option<String>,
    pub jwks_json: Option<String>,
    pub jwks_path: Option<String>,
    pub hmac_secret: Option<String>,
}

impl KeySources {
    pub fn is_empty(&self) -> bool {
        self.public_key_pem.is_none()
            && self.jwks_json.is_none()
            && self.jwks_path.is_none()
            && self.hmac_secret.is_none()
    }
}

impl fmt::Debug for KeySources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets
        f.debug_struct("KeySources")
            .field("public_key_pem", &self.public_key_pem.is_some())
            .field("jwks_json", &self.jwks_json.is_some())
            .field("jwks_path", &self.jwks_path)
            .field("hmac_secret", &self.hmac_secret.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub verifier: VerifierKind,
    pub key_sources: KeySources,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,

    // base URL of the remote validation authority (`auth.service.url`)
    pub auth_service_url: Option<Url>,
    pub auth_service_timeout: Duration,

    pub authenticate_result_template: String,
    pub http_request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Parse from any key lookup (the environment in production, a map in tests).
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(get("APP_ENV"));

        let verifier = match get("AUTH_VERIFIER") {
            Some(v) => v.parse::<VerifierKind>()?,
            None => VerifierKind::Local,
        };

        let key_sources = KeySources {
            public_key_pem: get("ACCESS_JWT_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n")),
            jwks_json: get("AUTH_JWKS"),
            jwks_path: get("AUTH_JWKS_PATH"),
            hmac_secret: get("AUTH_HMAC_SECRET"),
        };

        let auth_issuer = get("AUTH_ISSUER");
        let auth_audience = get("AUTH_AUDIENCE");

        let access_token_leeway_seconds = match get("ACCESS_TOKEN_LEEWAY_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"))?,
            None => local::DEFAULT_LEEWAY_SECONDS,
        };

        let auth_service_url = get("AUTH_SERVICE_URL")
            .or_else(|| get("auth.service.url"))
            .map(|v| Url::parse(v.trim()).map_err(|_| ConfigError::Invalid("AUTH_SERVICE_URL")))
            .transpose()?;

        let auth_service_timeout = match get("AUTH_SERVICE_TIMEOUT_MS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::Invalid("AUTH_SERVICE_TIMEOUT_MS")),
            },
            None => remote::DEFAULT_TIMEOUT,
        };

        let authenticate_result_template = lookup("AUTHENTICATE_RESULT_TEMPLATE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| delegate::DEFAULT_TEMPLATE.to_string());

        let http_request_timeout = match get("HTTP_REQUEST_TIMEOUT_SECONDS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::Invalid("HTTP_REQUEST_TIMEOUT_SECONDS")),
            },
            None => Duration::from_secs(30),
        };

        // The selected strategy must be usable at startup.
        match verifier {
            VerifierKind::Local if key_sources.is_empty() => {
                return Err(ConfigError::Missing(LOCAL_KEY_SOURCES));
            }
            VerifierKind::Remote if auth_service_url.is_none() => {
                return Err(ConfigError::Missing("AUTH_SERVICE_URL"));
            }
            // A slow authority must hit the client timeout (504), not the request timeout.
            VerifierKind::Remote if auth_service_timeout >= http_request_timeout => {
                return Err(ConfigError::Invalid("AUTH_SERVICE_TIMEOUT_MS"));
            }
            _ => {}
        }

        Ok(Self {
            addr,
            app_env,
            verifier,
            key_sources,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            auth_service_url,
            auth_service_timeout,
            authenticate_result_template,
            http_request_timeout,
        })
    }
}
