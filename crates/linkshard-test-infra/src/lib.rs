//! Disposable containers for integration tests.

mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
pub use mysql::{MySqlServer, ShardDbConfig};
pub use redis::{RedisConfig, RedisServer};
