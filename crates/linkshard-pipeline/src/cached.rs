use async_trait::async_trait;
use linkshard_core::{ShortCode, Store, StoreError, UrlCache};
use std::time::Duration;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, StoreError>;

/// A read-through, write-around cache in front of any [`Store`].
///
/// - `resolve` checks the cache, then falls through to the inner store on a
///   miss and populates the cache with `ttl` on success.
/// - `assign` goes straight to the inner store. A fresh code is not
///   cache-resident until its first resolve.
///
/// Cache failures never fail a request: a read error counts as a miss and a
/// write error is logged.
#[derive(Debug, Clone)]
pub struct CachedStore<S, C> {
    inner: S,
    cache: C,
    ttl: Duration,
}

impl<S: Store, C: UrlCache> CachedStore<S, C> {
    pub fn new(inner: S, cache: C, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Evicts a cached entry so the next resolve reads the inner store.
    pub async fn invalidate(&self, code: &ShortCode) -> Result<()> {
        trace!(code = %code, "Invalidating cache entry");
        self.cache
            .del(code)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl<S: Store, C: UrlCache> Store for CachedStore<S, C> {
    async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        self.inner.assign(long_url).await
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        match self.cache.get_url(code).await {
            Ok(Some(long_url)) => {
                debug!(code = %code, "Resolved from cache");
                return Ok(long_url);
            }
            Ok(None) => trace!(code = %code, "Cache miss"),
            Err(e) => warn!(code = %code, error = %e, "Cache read failed, treating as miss"),
        }

        let long_url = self.inner.resolve(code).await?;

        if let Err(e) = self.cache.set_url(code, &long_url, self.ttl).await {
            warn!(code = %code, error = %e, "Failed to populate cache");
        }

        Ok(long_url)
    }
}
