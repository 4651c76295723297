/*
 * Responsibility
 * - Load settings from environment variables (identity provider, verification policy, key cache)
 * - Validate values at startup (fail fast when something is missing or unparsable)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::{RoleSource, VerifyMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
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

/// Connection settings for the identity provider (Keycloak-style realm).
///
/// Loaded once at startup and never mutated afterwards; services receive it by reference.
#[derive(Clone)]
pub struct IdpConfig {
    /// Base URL used by this service to reach the provider (may be a cluster-internal host).
    pub server_url: Url,
    /// Base URL the provider advertises to clients; tokens carry it in `iss`.
    pub public_url: Url,
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub timeout_seconds: u64,
}

impl fmt::Debug for IdpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the client secret
        f.debug_struct("IdpConfig")
            .field("server_url", &self.server_url.as_str())
            .field("public_url", &self.public_url.as_str())
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("confidential", &self.client_secret.is_some())
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl IdpConfig {
    /// `"<public_url>/realms/<realm>"`, the exact `iss` value a realm stamps on its tokens.
    pub fn expected_issuer(&self) -> String {
        format!(
            "{}/realms/{}",
            self.public_url.as_str().trim_end_matches('/'),
            self.realm
        )
    }

    pub fn is_confidential_client(&self) -> bool {
        self.client_secret.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCacheBackend {
    None,
    Memory,
    Valkey,
}

impl FromStr for KeyCacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "valkey" | "redis" => Ok(Self::Valkey),
            _ => Err(ConfigError::Invalid("KEY_CACHE_BACKEND")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub verify_mode: VerifyMode,
    pub role_source: RoleSource,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct KeyCacheConfig {
    pub backend: KeyCacheBackend,
    pub ttl_seconds: u64,
    pub min_refresh_seconds: u64,
    pub valkey_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout_seconds: u64,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub idp: IdpConfig,
    pub auth: AuthConfig,
    pub key_cache: KeyCacheConfig,
    pub http: HttpConfig,
}

/// Longest accepted `KEY_CACHE_TTL_SECONDS` (one day).
pub const MAX_KEY_CACHE_TTL_SECONDS: u64 = 86_400;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key -> value source (the process environment in `from_env`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let port: u16 = env.number("PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(env.get("APP_ENV").as_deref());

        let idp = IdpConfig {
            server_url: env.url("IDP_SERVER_URL", "http://keycloak:8080")?,
            public_url: env.url("IDP_PUBLIC_URL", "http://localhost:8080")?,
            realm: env.non_empty("IDP_REALM", "cognevia-realm")?,
            client_id: env.non_empty("IDP_CLIENT_ID", "fastapi-client")?,
            client_secret: env.get("IDP_CLIENT_SECRET").filter(|s| !s.trim().is_empty()),
            timeout_seconds: env.positive("IDP_TIMEOUT_SECONDS", 5)?,
        };

        let verify_mode = env
            .get("AUTH_VERIFY_MODE")
            .unwrap_or_else(|| "strict".to_string())
            .parse::<VerifyMode>()
            .map_err(|_| ConfigError::Invalid("AUTH_VERIFY_MODE"))?;

        let role_source = env
            .get("AUTH_ROLE_SOURCE")
            .unwrap_or_else(|| "realm_and_clients".to_string())
            .parse::<RoleSource>()
            .map_err(|_| ConfigError::Invalid("AUTH_ROLE_SOURCE"))?;

        let algorithms =
            parse_algorithms(&env.get("AUTH_ALGORITHMS").unwrap_or_else(|| "RS256".to_string()))?;

        let leeway_seconds: u64 = env.number("AUTH_LEEWAY_SECONDS", 0)?;

        let backend = env
            .get("KEY_CACHE_BACKEND")
            .unwrap_or_default()
            .parse::<KeyCacheBackend>()?;

        let ttl_seconds: u64 = env.positive("KEY_CACHE_TTL_SECONDS", 300)?;
        if ttl_seconds > MAX_KEY_CACHE_TTL_SECONDS {
            return Err(ConfigError::Invalid("KEY_CACHE_TTL_SECONDS"));
        }
        let min_refresh_seconds: u64 = env.number("KEY_CACHE_MIN_REFRESH_SECONDS", 10)?;

        let valkey_url = env.get("VALKEY_URL").filter(|s| !s.trim().is_empty());
        if backend == KeyCacheBackend::Valkey && valkey_url.is_none() {
            return Err(ConfigError::Missing("VALKEY_URL"));
        }

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            request_timeout_seconds: env
                .positive("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)?,
            body_limit_bytes: env.positive("BODY_LIMIT_BYTES", defaults.body_limit_bytes)?,
        };

        Ok(Self {
            addr,
            app_env,
            idp,
            auth: AuthConfig {
                verify_mode,
                role_source,
                algorithms,
                leeway_seconds,
            },
            key_cache: KeyCacheConfig {
                backend,
                ttl_seconds,
                min_refresh_seconds,
                valkey_url,
            },
            http,
        })
    }
}

// Typed reads over a lookup. A key that is set must parse; only an unset key takes the default.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn number<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        }
    }

    fn positive<T: FromStr + PartialOrd + Default>(
        &self,
        key: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        let value = self.number(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid(key));
        }
        Ok(value)
    }

    fn url(&self, key: &'static str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.get(key).unwrap_or_else(|| default.to_string());
        Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid(key))
    }

    fn non_empty(&self, key: &'static str, default: &str) -> Result<String, ConfigError> {
        let value = self.get(key).unwrap_or_else(|| default.to_string());
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Missing(key));
        }
        Ok(value.to_string())
    }
}

pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let algorithms = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Algorithm::from_str(s).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS")))
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }
    Ok(algorithms)
}
