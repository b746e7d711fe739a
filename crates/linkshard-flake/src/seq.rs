use crate::Error;
use async_trait::async_trait;
use linkshard_core::base62::KEYSPACE;
use linkshard_core::IdAllocator;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic counter allocator.
///
/// Only unique within a single process. Useful for tests and single-node
/// tooling where a [`Flake`](crate::Flake) clock is unnecessary.
#[derive(Debug)]
pub struct SequenceAllocator {
    counter: AtomicU64,
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first id is `start`.
    ///
    /// Useful for resuming from a known state.
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

#[async_trait]
impl IdAllocator for SequenceAllocator {
    async fn allocate(&self) -> Result<u64, Error> {
        self.counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < KEYSPACE).then_some(n + 1)
            })
            .map_err(|_| Error::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn produces_sequential_ids() {
        let allocator = SequenceAllocator::new();
        assert_eq!(allocator.allocate().await, Ok(1));
        assert_eq!(allocator.allocate().await, Ok(2));
        assert_eq!(allocator.allocate().await, Ok(3));
    }

    #[tokio::test]
    async fn starting_at_offset() {
        let allocator = SequenceAllocator::starting_at(1000);
        assert_eq!(allocator.allocate().await, Ok(1000));
        assert_eq!(allocator.allocate().await, Ok(1001));
    }

    #[tokio::test]
    async fn exhausts_at_keyspace() {
        let allocator = SequenceAllocator::starting_at(KEYSPACE - 1);
        assert_eq!(allocator.allocate().await, Ok(KEYSPACE - 1));
        assert_eq!(allocator.allocate().await, Err(Error::Exhausted));
        assert_eq!(allocator.allocate().await, Err(Error::Exhausted));
    }

    #[tokio::test]
    async fn works_behind_arc_dyn() {
        let allocator: Arc<dyn IdAllocator> = Arc::new(SequenceAllocator::new());
        assert_eq!(allocator.allocate().await, Ok(1));
    }

    #[test]
    fn allocator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SequenceAllocator>();
    }
}
