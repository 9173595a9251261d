//! Look-aside caching of API representations.
//!
//! The store is the source of truth. Services consult the cache first, fall
//! back to the store on a miss, and repopulate best-effort. Every mutation
//! deletes the keys it could have made stale; there is no versioning, so
//! correctness relies on those deletions plus the fixed TTL.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

/// Lifetime of every cache entry.
pub const ENTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub(crate) const METRIC_CACHE_HIT: &str = "libris_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "libris_cache_miss_total";
pub(crate) const METRIC_CACHE_ERROR: &str = "libris_cache_error_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "libris_cache_invalidate_total";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Key/value store with per-entry expiry. A miss is `Ok(None)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Every cached representation, keyed by entity kind and optional id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AuthorsList,
    Author(i64),
    BooksList,
    Book(i64),
    /// Reviews are cached per parent book, never per review id.
    BookReviews(i64),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AuthorsList => f.write_str("authors_list"),
            CacheKey::Author(id) => write!(f, "author:{id}"),
            CacheKey::BooksList => f.write_str("books_list"),
            CacheKey::Book(id) => write!(f, "book:{id}"),
            CacheKey::BookReviews(book_id) => write!(f, "reviews_book:{book_id}"),
        }
    }
}

#[derive(Clone)]
pub struct LookAsideCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl LookAsideCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl: ENTRY_TTL,
        }
    }

    /// Return the cached value for `key`, or compute it with `load` and
    /// cache the result. Cache failures never fail the call.
    pub async fn get_or_load<T, E, F, Fut>(&self, key: CacheKey, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.read(key).await {
            return Ok(cached);
        }

        let value = load().await?;
        self.populate(key, &value).await;
        Ok(value)
    }

    /// Delete every key in `keys`. Failures are logged and skipped: the store
    /// mutation already succeeded and the TTL bounds any staleness.
    pub async fn invalidate<I>(&self, keys: I)
    where
        I: IntoIterator<Item = CacheKey>,
    {
        for key in keys {
            let rendered = key.to_string();
            match self.store.delete(&rendered).await {
                Ok(()) => {
                    counter!(METRIC_CACHE_INVALIDATE).increment(1);
                    debug!(target = "libris::cache", key = %rendered, "cache entry invalidated");
                }
                Err(err) => {
                    counter!(METRIC_CACHE_ERROR).increment(1);
                    warn!(
                        target = "libris::cache",
                        key = %rendered,
                        error = %err,
                        "failed to invalidate cache entry"
                    );
                }
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let rendered = key.to_string();
        let raw = match self.store.get(&rendered).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                return None;
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR).increment(1);
                warn!(
                    target = "libris::cache",
                    key = %rendered,
                    error = %err,
                    "cache read failed; falling back to store"
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(value)
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR).increment(1);
                warn!(
                    target = "libris::cache",
                    key = %rendered,
                    error = %err,
                    "discarding undecodable cache entry"
                );
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: CacheKey, value: &T) {
        let rendered = key.to_string();
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = "libris::cache", key = %rendered, error = %err, "failed to encode cache entry");
                return;
            }
        };

        if let Err(err) = self.store.set(&rendered, payload, self.ttl).await {
            counter!(METRIC_CACHE_ERROR).increment(1);
            warn!(
                target = "libris::cache",
                key = %rendered,
                error = %err,
                "failed to populate cache entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            if self.broken {
                return Err(CacheError::Unavailable("offline".into()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), CacheError> {
            if self.broken {
                return Err(CacheError::Unavailable("offline".into()));
            }
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), CacheError> {
            if self.broken {
                return Err(CacheError::Unavailable("offline".into()));
            }
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[test]
    fn keys_render_stable_names() {
        assert_eq!(CacheKey::AuthorsList.to_string(), "authors_list");
        assert_eq!(CacheKey::Author(7).to_string(), "author:7");
        assert_eq!(CacheKey::BooksList.to_string(), "books_list");
        assert_eq!(CacheKey::Book(3).to_string(), "book:3");
        assert_eq!(CacheKey::BookReviews(3).to_string(), "reviews_book:3");
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let store = Arc::new(MapStore::default());
        let cache = LookAsideCache::new(store.clone());

        let first: Result<Vec<i32>, ()> = cache
            .get_or_load(CacheKey::BooksList, || async { Ok(vec![1, 2]) })
            .await;
        let second: Result<Vec<i32>, ()> = cache
            .get_or_load(CacheKey::BooksList, || async { Err(()) })
            .await;

        assert_eq!(first, Ok(vec![1, 2]));
        assert_eq!(second, Ok(vec![1, 2]));
    }

    #[tokio::test]
    async fn invalidation_forces_reload() {
        let store = Arc::new(MapStore::default());
        let cache = LookAsideCache::new(store.clone());

        let _: Result<u8, ()> = cache.get_or_load(CacheKey::Book(1), || async { Ok(1) }).await;
        cache.invalidate([CacheKey::Book(1)]).await;
        let reloaded: Result<u8, ()> = cache.get_or_load(CacheKey::Book(1), || async { Ok(2) }).await;

        assert_eq!(reloaded, Ok(2));
    }

    #[tokio::test]
    async fn undecodable_entries_are_treated_as_misses() {
        let store = Arc::new(MapStore::default());
        store
            .entries
            .lock()
            .unwrap()
            .insert("author:1".into(), "not json".into());
        let cache = LookAsideCache::new(store);

        let value: Result<String, ()> = cache
            .get_or_load(CacheKey::Author(1), || async { Ok("fresh".to_string()) })
            .await;
        assert_eq!(value.as_deref(), Ok("fresh"));
    }

    #[tokio::test]
    async fn unavailable_backend_degrades_to_loader() {
        let store = Arc::new(MapStore {
            broken: true,
            ..Default::default()
        });
        let cache = LookAsideCache::new(store);

        let value: Result<u32, ()> = cache.get_or_load(CacheKey::AuthorsList, || async { Ok(9) }).await;
        cache.invalidate([CacheKey::AuthorsList]).await;
        assert_eq!(value, Ok(9));
    }

    #[tokio::test]
    async fn loader_errors_propagate_without_caching() {
        let store = Arc::new(MapStore::default());
        let cache = LookAsideCache::new(store.clone());

        let failed: Result<u8, &str> = cache
            .get_or_load(CacheKey::Book(4), || async { Err("store down") })
            .await;
        assert_eq!(failed, Err("store down"));
        assert!(store.entries.lock().unwrap().is_empty());
    }
}
