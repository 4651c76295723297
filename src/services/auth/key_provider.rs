//! Realm public-key retrieval.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use url::Url;

use crate::config::IdpConfig;
use crate::services::auth::AuthError;

/// A PEM-encoded (SPKI) public key used to verify token signatures.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    pem: String,
}

impl SigningKey {
    /// Wrap raw base64 key material (as served by the realm) in the PEM envelope.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            pem: format!(
                "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
                raw.trim()
            ),
        }
    }

    /// Accept an already-enveloped PEM (e.g. one read back from the key cache).
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self { pem: pem.into() }
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// Source of the identity provider's current signing key.
///
/// Any failure must surface as `AuthError::KeyUnavailable`.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    // Identifies the key source; used as the cache key by `CachedKeyProvider`.
    fn key_id(&self) -> &str;

    async fn fetch_public_key(&self) -> Result<SigningKey, AuthError>;

    // Drop any locally held copy of the key (called when a signature fails to verify,
    // so a rotated realm key is picked up by the next request). No-op without a cache.
    async fn invalidate(&self) {}
}

// Subset of the realm metadata document (`GET /realms/{realm}`).
#[derive(Debug, Deserialize)]
struct RealmMetadata {
    #[serde(default)]
    public_key: Option<String>,
}

/// Fetches the realm public key over HTTP on every call.
#[derive(Clone, Debug)]
pub struct RealmKeyProvider {
    client: reqwest::Client,
    realm_url: Url,
    realm: String,
}

impl RealmKeyProvider {
    pub fn new(idp: &IdpConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(idp.timeout_seconds))
            .build()
            .map_err(|e| AuthError::KeyUnavailable(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            realm_url: realm_url(&idp.server_url, &idp.realm)?,
            realm: idp.realm.clone(),
        })
    }
}

fn realm_url(server_url: &Url, realm: &str) -> Result<Url, AuthError> {
    let mut url = server_url.clone();
    url.path_segments_mut()
        .map_err(|_| AuthError::KeyUnavailable("identity provider URL cannot be a base".into()))?
        .pop_if_empty()
        .extend(["realms", realm]);
    Ok(url)
}

#[async_trait]
impl KeyProvider for RealmKeyProvider {
    fn key_id(&self) -> &str {
        &self.realm
    }

    async fn fetch_public_key(&self) -> Result<SigningKey, AuthError> {
        tracing::debug!(url = %self.realm_url, "fetching realm public key");

        let response = self
            .client
            .get(self.realm_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "realm metadata request failed with status {}",
                response.status()
            )));
        }

        let metadata: RealmMetadata = response
            .json()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("invalid realm metadata: {}", e)))?;

        let raw = metadata
            .public_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AuthError::KeyUnavailable("realm metadata has no public_key".into()))?;

        // The realm serves bare base64 DER; reject anything else before it reaches the verifier.
        STANDARD
            .decode(&raw)
            .map_err(|e| AuthError::KeyUnavailable(format!("public_key is not base64: {}", e)))?;

        Ok(SigningKey::from_raw(&raw))
    }
}
