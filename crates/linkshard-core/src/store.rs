use crate::error::StoreError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

type Result<T> = std::result::Result<T, StoreError>;

/// The contract every pipeline layer implements.
///
/// Layers wrap each other by value or through `Arc`, e.g. a cache in front of
/// a partitioned store: `CachedStore::new(PartitionedStore::new(..), cache)`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Mints a short code for `long_url` and persists the mapping.
    async fn assign(&self, long_url: &str) -> Result<ShortCode>;

    /// Resolves a short code to its long URL.
    ///
    /// Fails with [`StoreError::NotFound`] when no mapping exists.
    async fn resolve(&self, code: &ShortCode) -> Result<String>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        (**self).assign(long_url).await
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        (**self).resolve(code).await
    }
}

/// Position in a paged scan over every shard of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    /// Shard currently being scanned.
    pub shard: usize,
    /// Last id returned from that shard; `None` starts at the beginning.
    pub after_id: Option<u64>,
}

/// One page of a long URL scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub long_urls: Vec<String>,
    /// Where to continue, or `None` when the scan is complete.
    pub next: Option<ScanCursor>,
}

/// Lookups keyed by long URL rather than by code.
///
/// Needed by the deduplicating assign path and by membership filter rebuilds.
#[async_trait]
pub trait UrlIndex: Send + Sync + 'static {
    /// Returns an existing code for `long_url`, if any.
    async fn find_code(&self, long_url: &str) -> Result<Option<ShortCode>>;

    /// Returns up to `limit` long URLs starting at `cursor`.
    async fn scan_long_urls(&self, cursor: ScanCursor, limit: usize) -> Result<ScanPage>;
}

#[async_trait]
impl<I: UrlIndex + ?Sized> UrlIndex for Arc<I> {
    async fn find_code(&self, long_url: &str) -> Result<Option<ShortCode>> {
        (**self).find_code(long_url).await
    }

    async fn scan_long_urls(&self, cursor: ScanCursor, limit: usize) -> Result<ScanPage> {
        (**self).scan_long_urls(cursor, limit).await
    }
}
