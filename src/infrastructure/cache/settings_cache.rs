//! Cache for the public store settings served to every storefront page.
//!
//! Redis errors are logged and treated as a miss; the database stays the
//! source of truth.

use tracing::warn;

use super::{keys, Cache, RedisCache};
use crate::domain::StoreSetting;

/// Read-through cache of public settings. A `None` backend disables caching.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Option<RedisCache>,
    ttl_secs: u64,
}

impl SettingsCache {
    pub fn new(cache: Option<RedisCache>, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }

    pub fn disabled() -> Self {
        Self::new(None, 0)
    }

    pub async fn get_public(&self) -> Option<Vec<StoreSetting>> {
        let cache = self.cache.as_ref()?;
        match cache.get::<Vec<StoreSetting>>(keys::PUBLIC_SETTINGS).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "Settings cache read failed");
                None
            }
        }
    }

    pub async fn put_public(&self, settings: &[StoreSetting]) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache
            .set_ex(keys::PUBLIC_SETTINGS, &settings.to_vec(), self.ttl_secs)
            .await
        {
            warn!(error = %e, "Settings cache write failed");
        }
    }

    pub async fn invalidate(&self) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.delete(keys::PUBLIC_SETTINGS).await {
            warn!(error = %e, "Settings cache invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = SettingsCache::disabled();
        cache.put_public(&[]).await;
        cache.invalidate().await;
        assert!(cache.get_public().await.is_none());
    }
}
