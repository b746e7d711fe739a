use crate::Result;
use async_trait::async_trait;
use linkshard_core::{MappingRecord, ShortCode};
use std::sync::Arc;

/// One independent partition of the persistent store.
///
/// A missing row is `Ok(None)`, never an error, so callers can tell
/// "does not exist" apart from "could not find out".
#[async_trait]
pub trait Shard: Send + Sync + 'static {
    /// Inserts a new record.
    ///
    /// Fails with [`StoreError::Conflict`](crate::StoreError::Conflict) when
    /// the id or the short code is already taken.
    async fn insert(&self, record: &MappingRecord) -> Result<()>;

    /// Returns the long URL stored under `code`.
    async fn get(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Returns the oldest code stored for `long_url`.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>>;

    /// Returns up to `limit` records with `id > after_id`, ascending by id.
    async fn scan(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<MappingRecord>>;

    /// Creates the backing table if needed.
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: Shard + ?Sized> Shard for Arc<S> {
    async fn insert(&self, record: &MappingRecord) -> Result<()> {
        (**self).insert(record).await
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        (**self).get(code).await
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
        (**self).find_by_long_url(long_url).await
    }

    async fn scan(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<MappingRecord>> {
        (**self).scan(after_id, limit).await
    }

    async fn ensure_schema(&self) -> Result<()> {
        (**self).ensure_schema().await
    }
}
