/// Factory: build the `Authorizer` from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, KeyCacheBackend};
use crate::error::AppError;
use crate::services::auth::{
    Authorizer, CachedKeyProvider, KeyProvider, RealmKeyProvider, TokenVerifier,
    VerificationPolicy,
};
use crate::services::cache::{MemoryCache, ValkeyClient, client::ttl_seconds};

pub async fn build_authorizer(config: &Config) -> Result<Arc<Authorizer>, AppError> {
    let policy = VerificationPolicy::from_config(&config.idp, &config.auth).map_err(|e| {
        tracing::error!(error = %e, "invalid verification policy");
        AppError::Internal
    })?;

    let keys = build_key_provider(config).await?;
    let verifier = TokenVerifier::new(keys, policy);

    Ok(Arc::new(Authorizer::new(verifier, config.auth.role_source)))
}

async fn build_key_provider(config: &Config) -> Result<Arc<dyn KeyProvider>, AppError> {
    let realm = RealmKeyProvider::new(&config.idp).map_err(|e| {
        tracing::error!(error = %e, "failed to build identity provider client");
        AppError::Internal
    })?;
    let ttl = ttl_seconds(config.key_cache.ttl_seconds);
    let min_refresh = Duration::from_secs(config.key_cache.min_refresh_seconds);

    let keys: Arc<dyn KeyProvider> = match config.key_cache.backend {
        KeyCacheBackend::None => Arc::new(realm),
        KeyCacheBackend::Memory => Arc::new(
            CachedKeyProvider::new(realm, MemoryCache::new(), ttl).with_min_refresh(min_refresh),
        ),
        KeyCacheBackend::Valkey => {
            let url = config
                .key_cache
                .valkey_url
                .as_deref()
                .ok_or(AppError::Internal)?;
            let valkey = ValkeyClient::new(url).await.map_err(|e| {
                tracing::error!(error = %e, "failed to connect key cache backend");
                AppError::Internal
            })?;
            Arc::new(CachedKeyProvider::new(realm, valkey, ttl).with_min_refresh(min_refresh))
        }
    };

    Ok(keys)
}
