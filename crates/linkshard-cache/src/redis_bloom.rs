use async_trait::async_trait;
use linkshard_core::filter::Result;
use linkshard_core::{FilterScope, MembershipFilter};
use tracing::{debug, info, trace, warn};

use crate::bloom_filter::BloomFilterConfig;
use crate::map_redis_filter_error;

/// A [`MembershipFilter`] stored in Redis through the RedisBloom module.
///
/// Every instance talking to the same key shares one filter, so it stays
/// correct in multi-instance deployments. Requires a server with the `BF.*`
/// commands (Redis Stack or the RedisBloom module).
#[derive(Debug, Clone)]
pub struct RedisBloomFilter {
    conn: redis::aio::MultiplexedConnection,
    key: String,
}

impl RedisBloomFilter {
    /// Reserves the filter key if it does not exist yet.
    ///
    /// An existing filter keeps its original sizing; `BF.RESERVE` reporting
    /// that the item or key exists is not an error.
    pub async fn new(
        conn: redis::aio::MultiplexedConnection,
        config: &BloomFilterConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut reserve_conn = conn.clone();
        let reserved: redis::RedisResult<()> = redis::cmd("BF.RESERVE")
            .arg(&config.key)
            .arg(config.false_positive_rate)
            .arg(config.capacity)
            .query_async(&mut reserve_conn)
            .await;

        match reserved {
            Ok(()) => info!(
                key = %config.key,
                capacity = config.capacity,
                fp = config.false_positive_rate,
                "Reserved Redis bloom filter"
            ),
            Err(e) if is_already_reserved(&e) => {
                debug!(key = %config.key, "Redis bloom filter already exists")
            }
            Err(e) => {
                warn!(key = %config.key, error = %e, "Failed to reserve Redis bloom filter");
                return Err(map_redis_filter_error("failed to reserve bloom filter", e));
            }
        }

        Ok(Self {
            conn,
            key: config.key.clone(),
        })
    }

    /// Opens a multiplexed connection to `redis_url` and reserves the filter.
    pub async fn connect(redis_url: &str, config: &BloomFilterConfig) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_filter_error("invalid redis url", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_filter_error("failed to connect to Redis", e))?;
        Self::new(conn, config).await
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// RedisBloom versions word the "filter already exists" reply differently.
fn is_already_reserved(err: &redis::RedisError) -> bool {
    is_already_reserved_message(&err.to_string())
}

fn is_already_reserved_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("item exists") || message.contains("key exists")
}

#[async_trait]
impl MembershipFilter for RedisBloomFilter {
    async fn add(&self, item: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let added: bool = redis::cmd("BF.ADD")
            .arg(&self.key)
            .arg(item)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_filter_error("failed to add to bloom filter", e))?;
        trace!(key = %self.key, added, "BF.ADD");
        Ok(())
    }

    async fn test(&self, item: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("BF.EXISTS")
            .arg(&self.key)
            .arg(item)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_filter_error("failed to query bloom filter", e))?;
        trace!(key = %self.key, exists, "BF.EXISTS");
        Ok(exists)
    }

    fn scope(&self) -> FilterScope {
        FilterScope::Shared
    }
}
