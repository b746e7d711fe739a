use async_trait::async_trait;
use linkshard_core::cache::Result;
use linkshard_core::{ShortCode, UrlCache};
use std::time::Duration;
use tracing::{debug, trace};

/// A two-level cache: a fast local L1 in front of a shared L2.
///
/// - **Get**: try L1, then L2. An L2 hit is copied into L1 with the
///   backfill TTL, since the remaining L2 lifetime is unknown.
/// - **Set**: write L2 first, then L1.
/// - **Delete**: remove from both.
///
/// ```rust
/// use linkshard_cache::{LayeredCache, MokaUrlCache};
///
/// let l1 = MokaUrlCache::with_capacity(10_000);
/// // let l2 = RedisUrlCache::connect("redis://127.0.0.1/").await?;
/// let l2 = MokaUrlCache::with_capacity(100_000);
/// let cache = LayeredCache::new(l1, l2);
/// ```
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
    backfill_ttl: Duration,
}

impl<L1, L2> LayeredCache<L1, L2> {
    /// Creates a layered cache that backfills L1 for one minute.
    pub fn new(l1: L1, l2: L2) -> Self {
        Self {
            l1,
            l2,
            backfill_ttl: Duration::from_secs(60),
        }
    }

    pub fn with_backfill_ttl(mut self, ttl: Duration) -> Self {
        self.backfill_ttl = ttl;
        self
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }

    pub fn into_inner(self) -> (L1, L2) {
        (self.l1, self.l2)
    }
}

#[async_trait]
impl<L1, L2> UrlCache for LayeredCache<L1, L2>
where
    L1: UrlCache,
    L2: UrlCache,
{
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        if let Some(long_url) = self.l1.get_url(code).await? {
            debug!(code = %code, "L1 cache hit");
            return Ok(Some(long_url));
        }
        trace!(code = %code, "L1 cache miss, trying L2");

        match self.l2.get_url(code).await? {
            Some(long_url) => {
                debug!(code = %code, "L2 cache hit, backfilling L1");
                self.l1.set_url(code, &long_url, self.backfill_ttl).await?;
                Ok(Some(long_url))
            }
            None => {
                trace!(code = %code, "L2 cache miss");
                Ok(None)
            }
        }
    }

    async fn set_url(&self, code: &ShortCode, long_url: &str, ttl: Duration) -> Result<()> {
        self.l2.set_url(code, long_url, ttl).await?;
        self.l1.set_url(code, long_url, ttl).await?;
        debug!(code = %code, "Stored in L2 and L1 caches");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> Result<()> {
        self.l1.del(code).await?;
        self.l2.del(code).await?;
        debug!(code = %code, "Removed from L1 and L2 caches");
        Ok(())
    }
}
