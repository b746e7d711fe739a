//! Cache and membership filter backends for the Linkshard pipeline.

pub mod bloom_filter;
pub mod layered;
pub mod moka;
pub mod redis;
pub mod redis_bloom;

pub use bloom_filter::{BloomFilterConfig, LocalBloomFilter};
pub use layered::LayeredCache;
pub use moka::MokaUrlCache;
pub use redis::RedisUrlCache;
pub use redis_bloom::RedisBloomFilter;

use linkshard_core::{CacheError, FilterError};

/// Default prefix for cache keys.
pub const DEFAULT_KEY_PREFIX: &str = "ls:url:";

fn is_unreachable(err: &::redis::RedisError) -> bool {
    err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error()
}

fn is_timeout(err: &::redis::RedisError) -> bool {
    err.is_timeout() || err.to_string().to_ascii_lowercase().contains("timed out")
}

pub(crate) fn map_redis_error(operation: &str, err: ::redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if is_timeout(&err) {
        CacheError::Timeout(message)
    } else if is_unreachable(&err) {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

pub(crate) fn map_redis_filter_error(operation: &str, err: ::redis::RedisError) -> FilterError {
    let message = format!("{operation}: {err}");
    if is_timeout(&err) || is_unreachable(&err) {
        FilterError::Unavailable(message)
    } else {
        FilterError::Operation(message)
    }
}
