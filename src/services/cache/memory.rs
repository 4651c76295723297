use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::services::cache::client::{CacheClient, CacheResult};

/// In-process cache with per-entry expiry.
///
/// Expired entries are dropped lazily on read. An expiry past what `Instant` can
/// represent is stored as `None` and never expires.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (String, Option<Instant>)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if expires_at.is_none_or(|at| Instant::now() < at) => {
                    return Ok(Some(value.clone()));
                }
                None => return Ok(None),
                Some(_) => {}
            }
        }

        // expired
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let removed = self.entries.write().await.remove(key);
        Ok(u64::from(removed.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::client::ttl_seconds;

    #[tokio::test]
    async fn stores_and_reads_back() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("realm-key:demo", "pem", ttl_seconds(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get_string("realm-key:demo").await.unwrap().as_deref(),
            Some("pem")
        );
        assert_eq!(cache.get_string("realm-key:other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_millis(0))
            .await
            .unwrap();

        assert_eq!(cache.get_string("k").await.unwrap(), None);
        // lazily evicted
        assert_eq!(cache.del("k").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn huge_ttl_does_not_overflow_the_clock() {
        let cache = MemoryCache::new();
        cache
            .set_with_ttl("k", "v", Duration::from_secs(u64::MAX))
            .await
            .unwrap();

        assert_eq!(cache.get_string("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn del_reports_removed_count() {
        let cache = MemoryCache::new();
        cache.set_with_ttl("k", "v", ttl_seconds(60)).await.unwrap();

        assert_eq!(cache.del("k").await.unwrap(), 1);
        assert_eq!(cache.del("k").await.unwrap(), 0);
    }
}
