//! Fetch-then-cache-else-read-cache, as a reusable capability.
//!
//! Several resources in this system follow the same offline-first shape:
//! try the remote end, persist a good answer under a stable key, and when
//! the remote end is unreachable serve whatever was persisted last.
//! [`CloudOrCache`] captures that shape once instead of re-growing it at
//! every call site.

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::SharedStore;

/// A value that is fetched remotely when possible and served from the local
/// cache otherwise.
pub struct CloudOrCache<T> {
    store: SharedStore,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CloudOrCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a cached resource to a stable key.
    pub fn new(store: SharedStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    /// Run the fetch; cache and return its value on success, fall back to
    /// the cached copy on failure.
    pub async fn fetch_or_cached<F, Fut>(&self, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match fetch().await {
            Ok(value) => {
                let store = self.store.lock().await;
                if let Err(e) = store.put_cache(&self.key, &value) {
                    warn!("failed to cache '{}': {e}", self.key);
                }
                Some(value)
            }
            Err(failure) => {
                debug!("fetch for '{}' failed ({failure}); using cache", self.key);
                self.cached().await
            }
        }
    }

    /// Read the cached copy without fetching.
    pub async fn cached(&self) -> Option<T> {
        let store = self.store.lock().await;
        match store.get_cache(&self.key) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to read cache '{}': {e}", self.key);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;
    use verdant_store::Store;

    use crate::error::Failure;

    use super::*;

    fn store() -> SharedStore {
        Arc::new(Mutex::new(Store::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_successful_fetch_is_cached() {
        let store = store();
        let resource: CloudOrCache<Vec<String>> = CloudOrCache::new(Arc::clone(&store), "files");

        let fetched = resource
            .fetch_or_cached(|| async { Ok(vec!["010124.json".to_string()]) })
            .await;
        assert_eq!(fetched, Some(vec!["010124.json".to_string()]));

        // The value must now be readable without any fetch.
        assert_eq!(resource.cached().await, Some(vec!["010124.json".to_string()]));
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_cache() {
        let store = store();
        let resource: CloudOrCache<Vec<String>> = CloudOrCache::new(Arc::clone(&store), "files");

        resource
            .fetch_or_cached(|| async { Ok(vec!["010124.json".to_string()]) })
            .await;

        let fallback = resource
            .fetch_or_cached(|| async { Err(Failure::Connection("down".into())) })
            .await;
        assert_eq!(fallback, Some(vec!["010124.json".to_string()]));
    }

    #[tokio::test]
    async fn test_empty_cache_yields_none() {
        let resource: CloudOrCache<Vec<String>> = CloudOrCache::new(store(), "files");

        assert_eq!(resource.cached().await, None);
        let miss = resource
            .fetch_or_cached(|| async { Err(Failure::Connection("down".into())) })
            .await;
        assert_eq!(miss, None);
    }
}
