#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use realm_gate::config::IdpConfig;
use realm_gate::services::auth::{
    AuthError, Authorizer, KeyProvider, RoleSource, SigningKey, TokenVerifier,
    VerificationPolicy, VerifyMode,
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

pub const REALM_PRIVATE_PEM: &str = include_str!("../fixtures/realm_private.pem");
pub const REALM_PUBLIC_PEM: &str = include_str!("../fixtures/realm_public.pem");
// Valid RSA key the realm never published.
pub const ROGUE_PRIVATE_PEM: &str = include_str!("../fixtures/rogue_private.pem");

pub const REALM: &str = "demo";
pub const PUBLIC_URL: &str = "http://localhost:8080";
pub const ISSUER: &str = "http://localhost:8080/realms/demo";
pub const CLIENT_ID: &str = "api";

/// The public key as the realm serves it: bare base64, no PEM envelope.
pub fn raw_public_key() -> String {
    REALM_PUBLIC_PEM
        .lines()
        .filter(|l| !l.starts_with("-----"))
        .collect::<Vec<_>>()
        .concat()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims of a well-formed, currently valid token with no roles.
pub fn base_claims() -> Value {
    let now = now();
    json!({
        "iss": ISSUER,
        "aud": CLIENT_ID,
        "sub": "8d2f6c1e-0b4a-4c3e-9a57-2f7d1b6e9c10",
        "iat": now,
        "exp": now + 300,
        "typ": "Bearer",
        "azp": CLIENT_ID,
    })
}

pub fn with_realm_roles(mut claims: Value, roles: &[&str]) -> Value {
    claims["realm_access"] = json!({ "roles": roles });
    claims
}

pub fn sign_with(private_pem: &str, claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("test private key");
    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    jsonwebtoken::encode(&header, claims, &key).expect("sign test token")
}

pub fn sign(claims: &Value) -> String {
    sign_with(REALM_PRIVATE_PEM, claims)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// In-memory key provider that counts how it is used.
#[derive(Clone, Default)]
pub struct StaticKeyProvider {
    pub fetches: Arc<AtomicUsize>,
    pub invalidations: Arc<AtomicUsize>,
    pub unavailable: bool,
}

impl StaticKeyProvider {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    fn key_id(&self) -> &str {
        REALM
    }

    async fn fetch_public_key(&self) -> Result<SigningKey, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(AuthError::KeyUnavailable("connection refused".into()));
        }
        Ok(SigningKey::from_raw(&raw_public_key()))
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn policy(mode: VerifyMode) -> VerificationPolicy {
    VerificationPolicy::new(mode, &[Algorithm::RS256], ISSUER, CLIENT_ID, 0)
        .expect("test policy")
}

pub fn authorizer(
    keys: impl KeyProvider + 'static,
    mode: VerifyMode,
    source: RoleSource,
) -> Authorizer {
    Authorizer::new(TokenVerifier::new(Arc::new(keys), policy(mode)), source)
}

pub fn idp_config(server_url: &str, timeout_seconds: u64) -> IdpConfig {
    IdpConfig {
        server_url: Url::parse(server_url).expect("server url"),
        public_url: Url::parse(PUBLIC_URL).expect("public url"),
        realm: REALM.to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: None,
        timeout_seconds,
    }
}

/// What the mock realm endpoint answers with.
#[derive(Clone, Debug)]
pub enum RealmBehavior {
    Healthy,
    ServerError,
    NoPublicKey,
    GarbageKey,
    Slow(Duration),
}

async fn realm_handler(State(behavior): State<RealmBehavior>) -> impl IntoResponse {
    let metadata = |public_key: Option<String>| {
        let mut body = json!({
            "realm": REALM,
            "token-service": format!("{}/realms/{}/protocol/openid-connect", PUBLIC_URL, REALM),
            "account-service": format!("{}/realms/{}/account", PUBLIC_URL, REALM),
            "tokens-not-before": 0,
        });
        if let Some(k) = public_key {
            body["public_key"] = Value::String(k);
        }
        body
    };

    match behavior {
        RealmBehavior::Healthy => (StatusCode::OK, Json(metadata(Some(raw_public_key())))),
        RealmBehavior::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "unknown_error" })),
        ),
        RealmBehavior::NoPublicKey => (StatusCode::OK, Json(metadata(None))),
        RealmBehavior::GarbageKey => (
            StatusCode::OK,
            Json(metadata(Some("not base64 at all!".to_string()))),
        ),
        RealmBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, Json(metadata(Some(raw_public_key()))))
        }
    }
}

/// Start a mock realm metadata server (`GET /realms/{realm}`) on a random port.
pub async fn start_mock_realm(behavior: RealmBehavior) -> (String, JoinHandle<()>) {
    let app = Router::new()
        .route("/realms/{realm}", get(realm_handler))
        .with_state(behavior);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, handle)
}

/// A base URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
