//! Cache Module
//!
//! Redis connection management and caching utilities.
//!
//! Redis is optional: without `REDIS_URL` the server runs with caching and
//! rate limiting disabled.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! |  SettingsCache    |  <-- Domain-specific read-through cache
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |   Cache Trait     |  <-- Abstract interface
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |   RedisCache      |  <-- Concrete implementation
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | ConnectionManager |  <-- Redis connection with reconnect
//! +-------------------+
//! ```

mod cache_service;
mod settings_cache;

pub use cache_service::{Cache, RedisCache};
pub use settings_cache::SettingsCache;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key names and prefixes.
pub mod keys {
    /// Namespace for every key written by this service
    pub const NAMESPACE: &str = "flower_shop:";

    /// Public store settings list
    pub const PUBLIC_SETTINGS: &str = "settings:public";

    /// Prefix for rate limiting windows (e.g., "ratelimit:auth:203.0.113.7")
    pub const RATE_LIMIT: &str = "ratelimit:";

    /// Generates a rate limit key
    #[inline]
    pub fn rate_limit(tier: &str, client: impl std::fmt::Display) -> String {
        format!("{}{}{}:{}", NAMESPACE, RATE_LIMIT, tier, client)
    }
}
