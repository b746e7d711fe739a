use linkshard_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container failed: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis fixture failed: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// The shard never accepted a connection while the container booted.
    #[error("shard unreachable after {attempts} attempts: {last}")]
    ShardUnreachable { attempts: u32, last: StoreError },

    #[error("shard schema failed: {0}")]
    Schema(StoreError),
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
