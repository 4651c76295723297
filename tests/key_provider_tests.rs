//! `RealmKeyProvider` against a mock realm metadata endpoint.

mod common;

use std::{sync::Arc, time::Duration};

use common::*;
use realm_gate::services::auth::{
    AuthError, Authorizer, CachedKeyProvider, KeyProvider, RealmKeyProvider, RolePredicate,
    RoleSource, TokenVerifier, VerifyMode,
};
use realm_gate::services::cache::MemoryCache;

#[tokio::test]
async fn fetches_and_envelopes_realm_key() {
    let (base_url, _server) = start_mock_realm(RealmBehavior::Healthy).await;
    let provider = RealmKeyProvider::new(&idp_config(&base_url, 5)).unwrap();

    let key = provider.fetch_public_key().await.unwrap();

    assert!(key.pem().starts_with("-----BEGIN PUBLIC KEY-----\n"));
    assert!(key.pem().ends_with("\n-----END PUBLIC KEY-----"));
    assert!(key.pem().contains(&raw_public_key()));
    assert_eq!(provider.key_id(), REALM);
}

#[tokio::test]
async fn fetched_key_verifies_realm_tokens() {
    let (base_url, _server) = start_mock_realm(RealmBehavior::Healthy).await;
    let provider = RealmKeyProvider::new(&idp_config(&base_url, 5)).unwrap();
    let auth = Authorizer::new(
        TokenVerifier::new(Arc::new(provider), policy(VerifyMode::Strict)),
        RoleSource::RealmAndClients,
    );

    let token = sign(&with_realm_roles(base_claims(), &["USER"]));
    let roles = auth
        .authorize(Some(&bearer(&token)), &RolePredicate::user_or_admin())
        .await
        .unwrap();

    assert!(roles.contains("USER"));
}

#[tokio::test]
async fn connection_refused_is_key_unavailable() {
    let provider = RealmKeyProvider::new(&idp_config(&unreachable_url().await, 5)).unwrap();

    let err = provider.fetch_public_key().await.unwrap_err();
    assert!(matches!(err, AuthError::KeyUnavailable(_)), "{:?}", err);
}

#[tokio::test]
async fn unreachable_provider_fails_before_signature_check() {
    let provider = RealmKeyProvider::new(&idp_config(&unreachable_url().await, 5)).unwrap();
    let auth = Authorizer::new(
        TokenVerifier::new(Arc::new(provider), policy(VerifyMode::Strict)),
        RoleSource::RealmAndClients,
    );

    // forged token: would be InvalidToken if the signature were ever checked
    let forged = sign_with(ROGUE_PRIVATE_PEM, &base_claims());
    let err = auth.roles(Some(&bearer(&forged))).await.unwrap_err();

    assert!(matches!(err, AuthError::KeyUnavailable(_)));
}

#[tokio::test]
async fn error_status_is_key_unavailable() {
    let (base_url, _server) = start_mock_realm(RealmBehavior::ServerError).await;
    let provider = RealmKeyProvider::new(&idp_config(&base_url, 5)).unwrap();

    let err = provider.fetch_public_key().await.unwrap_err();
    match err {
        AuthError::KeyUnavailable(cause) => assert!(cause.contains("500"), "{}", cause),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn malformed_metadata_is_key_unavailable() {
    for behavior in [RealmBehavior::NoPublicKey, RealmBehavior::GarbageKey] {
        let (base_url, _server) = start_mock_realm(behavior.clone()).await;
        let provider = RealmKeyProvider::new(&idp_config(&base_url, 5)).unwrap();

        let err = provider.fetch_public_key().await.unwrap_err();
        assert!(
            matches!(err, AuthError::KeyUnavailable(_)),
            "{:?} -> {:?}",
            behavior,
            err
        );
    }
}

#[tokio::test]
async fn timeout_is_key_unavailable() {
    let (base_url, _server) =
        start_mock_realm(RealmBehavior::Slow(Duration::from_secs(5))).await;
    let provider = RealmKeyProvider::new(&idp_config(&base_url, 1)).unwrap();

    let err = provider.fetch_public_key().await.unwrap_err();
    assert!(matches!(err, AuthError::KeyUnavailable(_)));
}

#[tokio::test]
async fn cached_provider_survives_provider_outage_within_ttl() {
    let (base_url, server) = start_mock_realm(RealmBehavior::Healthy).await;
    let provider = CachedKeyProvider::new(
        RealmKeyProvider::new(&idp_config(&base_url, 1)).unwrap(),
        MemoryCache::new(),
        Duration::from_secs(60),
    );

    let first = provider.fetch_public_key().await.unwrap();
    server.abort();
    let _ = server.await;

    let second = provider.fetch_public_key().await.unwrap();
    assert_eq!(first, second);
}
