use crate::error::AllocatorError;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of unique 64-bit record ids.
///
/// Implementations may suspend the caller while waiting for a fresh value
/// but never return the same id twice.
#[async_trait]
pub trait IdAllocator: Send + Sync + 'static {
    async fn allocate(&self) -> Result<u64, AllocatorError>;
}

#[async_trait]
impl<A: IdAllocator + ?Sized> IdAllocator for Arc<A> {
    async fn allocate(&self) -> Result<u64, AllocatorError> {
        (**self).allocate().await
    }
}
