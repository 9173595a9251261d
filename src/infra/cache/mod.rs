//! Cache store adapters.

mod memory;
mod redis_store;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::cache::CacheStore;
use crate::config::{CacheBackend, CacheSettings};
use crate::infra::error::InfraError;

/// Build the configured store. An unreachable Redis at startup is logged but
/// not fatal: reads degrade to the database until it comes back.
pub async fn build_cache_store(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, InfraError> {
    match &settings.backend {
        CacheBackend::Memory => {
            info!(target = "libris::cache", "using in-process cache");
            Ok(Arc::new(MemoryCache::new()))
        }
        CacheBackend::Redis { url } => {
            let cache = RedisCache::connect(url, settings.pool_size, settings.timeout)?;
            match cache.ping().await {
                Ok(()) => info!(target = "libris::cache", "connected to redis"),
                Err(err) => warn!(
                    target = "libris::cache",
                    error = %err,
                    "redis unreachable at startup; serving from the database until it recovers"
                ),
            }
            Ok(Arc::new(cache))
        }
    }
}
