//! Time-bounded realm key cache.
//!
//! Wraps another `KeyProvider`; disabled unless `KEY_CACHE_BACKEND` selects a backend.
//! Cache failures fail open (logged, then treated as a miss). Fetch errors are never cached.
//! Evictions after a failed signature are spaced at least `min_refresh` apart, so forged
//! tokens cannot force an identity provider round-trip per request.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::services::auth::key_provider::{KeyProvider, SigningKey};
use crate::services::auth::AuthError;
use crate::services::cache::CacheClient;

pub struct CachedKeyProvider<P, C> {
    inner: P,
    cache: C,
    ttl: Duration,
    cache_key: String,
    min_refresh: Duration,
    last_eviction: Mutex<Option<Instant>>,
}

impl<P: KeyProvider, C: CacheClient> CachedKeyProvider<P, C> {
    pub fn new(inner: P, cache: C, ttl: Duration) -> Self {
        let cache_key = format!("realm-key:{}", inner.key_id());
        Self {
            inner,
            cache,
            ttl,
            cache_key,
            min_refresh: Duration::ZERO,
            last_eviction: Mutex::new(None),
        }
    }

    /// Ignore eviction requests arriving within `interval` of the previous eviction.
    pub fn with_min_refresh(mut self, interval: Duration) -> Self {
        self.min_refresh = interval;
        self
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}

impl<P, C: CacheClient> std::fmt::Debug for CachedKeyProvider<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeyProvider")
            .field("backend", &self.cache.backend_name())
            .field("cache_key", &self.cache_key)
            .field("ttl", &self.ttl)
            .field("min_refresh", &self.min_refresh)
            .finish()
    }
}

#[async_trait]
impl<P: KeyProvider, C: CacheClient> KeyProvider for CachedKeyProvider<P, C> {
    fn key_id(&self) -> &str {
        self.inner.key_id()
    }

    async fn fetch_public_key(&self) -> Result<SigningKey, AuthError> {
        match self.cache.get_string(&self.cache_key).await {
            Ok(Some(pem)) => return Ok(SigningKey::from_pem(pem)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    backend = self.cache.backend_name(),
                    "key cache read failed; fetching from identity provider"
                );
            }
        }

        let key = self.inner.fetch_public_key().await?;

        if let Err(err) = self
            .cache
            .set_with_ttl(&self.cache_key, key.pem(), self.ttl)
            .await
        {
            tracing::warn!(
                error = %err,
                backend = self.cache.backend_name(),
                "key cache write failed"
            );
        }

        Ok(key)
    }

    async fn invalidate(&self) {
        {
            let mut last = self.last_eviction.lock().await;
            if last.is_some_and(|at| at.elapsed() < self.min_refresh) {
                tracing::debug!(cache_key = %self.cache_key, "key evicted recently; keeping cached key");
                return;
            }
            *last = Some(Instant::now());
        }

        if let Err(err) = self.cache.del(&self.cache_key).await {
            tracing::warn!(
                error = %err,
                backend = self.cache.backend_name(),
                "key cache eviction failed"
            );
        }
        self.inner.invalidate().await;
    }
}
