//! Persistent shards and the hash-partitioned store built on them.

pub mod memory;
pub mod mysql;
pub mod partitioned;
pub mod router;
pub mod shard;

pub use memory::InMemoryShard;
pub use mysql::{MySqlShard, PoolSettings};
pub use partitioned::PartitionedStore;
pub use router::ShardRouter;
pub use shard::Shard;

pub use linkshard_core::StoreError;

/// Result type for shard operations.
pub type Result<T> = std::result::Result<T, StoreError>;
