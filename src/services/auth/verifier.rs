use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{fmt, str::FromStr, sync::Arc};

use crate::config::{AuthConfig, ConfigError, IdpConfig};
use crate::services::auth::header::bearer_token;
use crate::services::auth::key_provider::{KeyProvider, SigningKey};
use crate::services::auth::AuthError;

/// How strictly identity claims are checked.
///
/// - `Strict`: signature + `exp`/`nbf`/`iat` + exact `iss` + `aud` must contain the client id
/// - `Legacy`: same as `Strict` except that the audience is not checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    Strict,
    Legacy,
}

impl FromStr for VerifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown verification mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

fn key_family(alg: Algorithm) -> Option<KeyFamily> {
    match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => Some(KeyFamily::Rsa),
        Algorithm::ES256 | Algorithm::ES384 => Some(KeyFamily::Ec),
        Algorithm::EdDSA => Some(KeyFamily::Ed),
        // HMAC needs a shared secret, never a realm public key
        _ => None,
    }
}

/// Verified token payload. Only constructed after signature and claim checks pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Explicit verification policy; built once from configuration.
#[derive(Clone)]
pub struct VerificationPolicy {
    mode: VerifyMode,
    family: KeyFamily,
    leeway_seconds: u64,
    validation: Validation,
}

impl fmt::Debug for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationPolicy")
            .field("mode", &self.mode)
            .field("algorithms", &self.validation.algorithms)
            .field("iss", &self.validation.iss)
            .field("aud", &self.validation.aud)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl VerificationPolicy {
    pub fn new(
        mode: VerifyMode,
        algorithms: &[Algorithm],
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, ConfigError> {
        let first = *algorithms
            .first()
            .ok_or(ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        let family = key_family(first).ok_or(ConfigError::Invalid("AUTH_ALGORITHMS"))?;

        // One realm key verifies every accepted algorithm, so they must share a key type.
        if algorithms.iter().any(|a| key_family(*a) != Some(family)) {
            return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
        }

        let mut validation = Validation::new(first);
        validation.algorithms = algorithms.to_vec();
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;

        validation.set_issuer(&[issuer]);

        match mode {
            VerifyMode::Strict => {
                validation.set_audience(&[audience]);
                validation.set_required_spec_claims(&["exp", "iss", "aud"]);
            }
            VerifyMode::Legacy => {
                validation.validate_aud = false;
                validation.set_required_spec_claims(&["exp", "iss"]);
            }
        }

        Ok(Self {
            mode,
            family,
            leeway_seconds,
            validation,
        })
    }

    pub fn from_config(idp: &IdpConfig, auth: &AuthConfig) -> Result<Self, ConfigError> {
        Self::new(
            auth.verify_mode,
            &auth.algorithms,
            &idp.expected_issuer(),
            &idp.client_id,
            auth.leeway_seconds,
        )
    }

    fn decoding_key(&self, key: &SigningKey) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        let pem = key.pem().as_bytes();
        match self.family {
            KeyFamily::Rsa => DecodingKey::from_rsa_pem(pem),
            KeyFamily::Ec => DecodingKey::from_ec_pem(pem),
            KeyFamily::Ed => DecodingKey::from_ed_pem(pem),
        }
    }

    /// Verify signature and claims of `token` against `key`.
    pub fn decode(
        &self,
        token: &str,
        key: &SigningKey,
    ) -> Result<ClaimSet, jsonwebtoken::errors::Error> {
        let decoding_key = self.decoding_key(key)?;
        let data = jsonwebtoken::decode::<ClaimSet>(token, &decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    // jsonwebtoken does not look at `iat`; a token minted in the future is rejected here.
    fn check_issued_at(&self, claims: &ClaimSet) -> Result<(), AuthError> {
        let Some(iat) = claims.get("iat") else {
            return Ok(());
        };
        let iat = iat
            .as_f64()
            .ok_or_else(|| AuthError::InvalidToken("'iat' claim is not a number".into()))?;

        let now = chrono::Utc::now().timestamp() as f64;
        if iat > now + self.leeway_seconds as f64 {
            return Err(AuthError::InvalidToken(
                "token issued in the future ('iat')".into(),
            ));
        }
        Ok(())
    }
}

/// Bearer-token verifier: header parsing, key retrieval, signature and claim validation.
///
/// Stateless per call; share it behind an `Arc`.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeyProvider>,
    policy: VerificationPolicy,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key_id", &self.keys.key_id())
            .field("policy", &self.policy)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeyProvider>, policy: VerificationPolicy) -> Self {
        Self { keys, policy }
    }

    /// Verify `Authorization` header contents and return the token's claims.
    ///
    /// Header problems are reported before the key provider is contacted, and
    /// `KeyUnavailable` is reported before any signature work.
    pub async fn verify(&self, header: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = bearer_token(header)?;
        let key = self.keys.fetch_public_key().await?;

        let claims = match self.policy.decode(token, &key) {
            Ok(claims) => claims,
            Err(err) => {
                let bad_signature = matches!(err.kind(), ErrorKind::InvalidSignature);
                let err = AuthError::from(err);
                if bad_signature {
                    // The realm may have rotated its key.
                    self.keys.invalidate().await;
                }
                return Err(err);
            }
        };

        self.policy.check_issued_at(&claims)?;
        Ok(claims)
    }
}
