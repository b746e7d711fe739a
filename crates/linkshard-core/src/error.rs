use jiff::Timestamp;
use std::time::Duration;
use thiserror::Error;

/// Errors raised when validating core domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Errors returned by ID allocators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AllocatorError {
    #[error("invalid node id {node_id}; expected 0..={max_node_id}")]
    InvalidNodeId { node_id: u8, max_node_id: u8 },
    #[error("epoch is ahead of current clock time: epoch={epoch}, now={now}")]
    EpochAhead { epoch: Timestamp, now: Timestamp },
    #[error("overtime limit")]
    OverTimeLimit,
    #[error("clock moved backwards by {drift:?}, more than the allowed wait")]
    ClockMovedBackwards { drift: Duration },
    #[error("id space exhausted")]
    Exhausted,
}

/// Errors returned by cache backends.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Errors returned by membership filters.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("filter backend unavailable: {0}")]
    Unavailable(String),
    #[error("filter initialization failed: {0}")]
    Initialization(String),
    #[error("filter operation failed: {0}")]
    Operation(String),
}

/// Errors returned by [`Store`](crate::Store) implementations.
///
/// `NotFound` means the code has no mapping in its routed shard; it is a
/// definite answer. `Unavailable` and `Timeout` mean the answer could not be
/// obtained and the caller may retry.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("id allocation failed: {0}")]
    Allocation(#[from] AllocatorError),
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Whether the failure is a transient backend condition rather than a
    /// definite answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

impl From<CoreError> for StoreError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => StoreError::InvalidInput(message),
        }
    }
}
