use linkshard_core::{AllocatorError, CacheError, FilterError, StoreError};
use thiserror::Error;

/// Errors raised while assembling a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Allocator(#[from] AllocatorError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}
