use crate::router::ShardRouter;
use crate::shard::Shard;
use crate::{Result, StoreError};
use async_trait::async_trait;
use linkshard_core::{IdAllocator, MappingRecord, ScanCursor, ScanPage, ShortCode, Store, UrlIndex};
use tracing::{debug, trace};

/// A store split across N independent shards.
///
/// Every code lives on shard `fnv1a(code) mod N`, on both the write path and
/// the read path. Assign never checks for an existing mapping, so the same
/// long URL submitted twice gets two distinct codes.
pub struct PartitionedStore<S, A> {
    shards: Vec<S>,
    router: ShardRouter,
    allocator: A,
}

impl<S: Shard, A: IdAllocator> PartitionedStore<S, A> {
    /// Fails with `InvalidInput` when `shards` is empty.
    pub fn new(shards: Vec<S>, allocator: A) -> Result<Self> {
        if shards.is_empty() {
            return Err(StoreError::InvalidInput(
                "a partitioned store needs at least one shard".to_string(),
            ));
        }
        let router = ShardRouter::new(shards.len());
        Ok(Self {
            shards,
            router,
            allocator,
        })
    }

    pub fn shard_count(&self) -> usize {
        self.router.shard_count()
    }

    /// Index of the shard that owns `code`.
    pub fn route(&self, code: &ShortCode) -> usize {
        self.router.route(code)
    }

    pub fn shards(&self) -> &[S] {
        &self.shards
    }

    fn shard_for(&self, code: &ShortCode) -> (usize, &S) {
        let idx = self.router.route(code);
        (idx, &self.shards[idx])
    }
}

#[async_trait]
impl<S: Shard, A: IdAllocator> Store for PartitionedStore<S, A> {
    async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        let id = self.allocator.allocate().await?;
        let record = MappingRecord::new(id, long_url);
        let (shard, backend) = self.shard_for(&record.short_code);

        backend.insert(&record).await?;
        debug!(code = %record.short_code, id, shard, "Assigned short code");
        Ok(record.short_code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        let (shard, backend) = self.shard_for(code);
        trace!(code = %code, shard, "Routing resolve");

        backend
            .get(code)
            .await?
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }
}

#[async_trait]
impl<S: Shard, A: IdAllocator> UrlIndex for PartitionedStore<S, A> {
    /// Asks every shard in index order. Linear in the shard count, which is
    /// acceptable only because dedupe runs with a single shard.
    async fn find_code(&self, long_url: &str) -> Result<Option<ShortCode>> {
        for shard in &self.shards {
            if let Some(code) = shard.find_by_long_url(long_url).await? {
                return Ok(Some(code));
            }
        }
        Ok(None)
    }

    async fn scan_long_urls(&self, cursor: ScanCursor, limit: usize) -> Result<ScanPage> {
        if limit == 0 {
            return Err(StoreError::InvalidInput(
                "scan limit must be positive".to_string(),
            ));
        }
        let Some(shard) = self.shards.get(cursor.shard) else {
            return Ok(ScanPage::default());
        };

        let records = shard.scan(cursor.after_id, limit).await?;
        let next = match records.last() {
            Some(last) if records.len() == limit => Some(ScanCursor {
                shard: cursor.shard,
                after_id: Some(last.id),
            }),
            _ if cursor.shard + 1 < self.shards.len() => Some(ScanCursor {
                shard: cursor.shard + 1,
                after_id: None,
            }),
            _ => None,
        };

        Ok(ScanPage {
            long_urls: records.into_iter().map(|record| record.long_url).collect(),
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryShard;
    use linkshard_core::base62::KEYSPACE;
    use linkshard_core::AllocatorError;
    use linkshard_flake::SequenceAllocator;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records how often each operation reached this shard.
    #[derive(Default)]
    struct CountingShard {
        inner: InMemoryShard,
        inserts: AtomicUsize,
        gets: AtomicUsize,
    }

    #[async_trait]
    impl Shard for CountingShard {
        async fn insert(&self, record: &MappingRecord) -> Result<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(record).await
        }

        async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(code).await
        }

        async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
            self.inner.find_by_long_url(long_url).await
        }

        async fn scan(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<MappingRecord>> {
            self.inner.scan(after_id, limit).await
        }
    }

    struct UnreachableShard;

    #[async_trait]
    impl Shard for UnreachableShard {
        async fn insert(&self, _record: &MappingRecord) -> Result<()> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _code: &ShortCode) -> Result<Option<String>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_by_long_url(&self, _long_url: &str) -> Result<Option<ShortCode>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn scan(&self, _after_id: Option<u64>, _limit: usize) -> Result<Vec<MappingRecord>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn single_shard_store() -> PartitionedStore<InMemoryShard, SequenceAllocator> {
        PartitionedStore::new(vec![InMemoryShard::new()], SequenceAllocator::new()).unwrap()
    }

    fn memory_shards(n: usize) -> Vec<InMemoryShard> {
        (0..n).map(|_| InMemoryShard::new()).collect()
    }

    #[test]
    fn empty_shard_list_is_rejected() {
        let result = PartitionedStore::<InMemoryShard, _>::new(vec![], SequenceAllocator::new());
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn first_assign_gets_code_for_id_one() {
        let store = single_shard_store();
        let code = store.assign("https://example.com").await.unwrap();
        assert_eq!(code.as_str(), "0000001");
    }

    #[tokio::test]
    async fn resolve_returns_assigned_url() {
        let store = single_shard_store();
        store.assign("https://example.com").await.unwrap();

        let long_url = store.resolve(&ShortCode::new("0000001").unwrap()).await.unwrap();
        assert_eq!(long_url, "https://example.com");
    }

    #[tokio::test]
    async fn resolve_unknown_code_is_not_found() {
        let store = PartitionedStore::new(memory_shards(3), SequenceAllocator::new()).unwrap();
        let err = store
            .resolve(&ShortCode::new("9999999").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref code) if code == "9999999"));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn code_routed_to_shard_one_is_only_read_from_shard_one() {
        let shards = vec![Arc::new(CountingShard::default()), Arc::new(CountingShard::default())];
        let probe = PartitionedStore::new(shards.clone(), SequenceAllocator::new()).unwrap();
        let id = (1..)
            .find(|&id| probe.route(&ShortCode::from_id(id)) == 1)
            .unwrap();

        let store = PartitionedStore::new(shards.clone(), SequenceAllocator::starting_at(id)).unwrap();
        let code = store.assign("https://example.com").await.unwrap();
        assert_eq!(store.route(&code), 1);

        assert_eq!(store.resolve(&code).await.unwrap(), "https://example.com");

        assert_eq!(shards[0].inserts.load(Ordering::SeqCst), 0);
        assert_eq!(shards[0].gets.load(Ordering::SeqCst), 0);
        assert_eq!(shards[1].inserts.load(Ordering::SeqCst), 1);
        assert_eq!(shards[1].gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn same_url_twice_yields_two_resolvable_codes() {
        let store = PartitionedStore::new(memory_shards(2), SequenceAllocator::new()).unwrap();
        let first = store.assign("https://example.com").await.unwrap();
        let second = store.assign("https://example.com").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.resolve(&first).await.unwrap(), "https://example.com");
        assert_eq!(store.resolve(&second).await.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn every_record_lives_on_its_routed_shard() {
        let store = PartitionedStore::new(memory_shards(4), SequenceAllocator::new()).unwrap();
        let mut codes = vec![];
        for i in 0..100 {
            codes.push(store.assign(&format!("https://example.com/{i}")).await.unwrap());
        }

        for code in &codes {
            let home = store.route(code);
            for (idx, shard) in store.shards().iter().enumerate() {
                let present = shard.get(code).await.unwrap().is_some();
                assert_eq!(present, idx == home, "code {code} on shard {idx}");
            }
        }
        let total: usize = store.shards().iter().map(InMemoryShard::len).sum();
        assert_eq!(total, 100);
    }

    #[tokio::test]
    async fn concurrent_assigns_of_same_url_all_succeed() {
        let store = Arc::new(
            PartitionedStore::new(memory_shards(3), SequenceAllocator::new()).unwrap(),
        );
        let mut handles = vec![];
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.assign("https://same.example").await.unwrap()
            }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap());
        }
        assert_eq!(codes.len(), 32);
        for code in &codes {
            assert_eq!(store.resolve(code).await.unwrap(), "https://same.example");
        }
    }

    #[tokio::test]
    async fn unreachable_shard_is_transient_not_not_found() {
        let store = PartitionedStore::new(vec![UnreachableShard], SequenceAllocator::new()).unwrap();

        let err = store.resolve(&ShortCode::from_id(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_transient());

        let err = store.assign("https://example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn allocator_failure_fails_assign() {
        let store = PartitionedStore::new(
            vec![InMemoryShard::new()],
            SequenceAllocator::starting_at(KEYSPACE),
        )
        .unwrap();

        let err = store.assign("https://example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Allocation(AllocatorError::Exhausted)));
        assert!(store.shards()[0].is_empty());
    }

    #[tokio::test]
    async fn find_code_searches_all_shards() {
        let store = PartitionedStore::new(memory_shards(3), SequenceAllocator::new()).unwrap();
        let code = store.assign("https://needle.example").await.unwrap();
        store.assign("https://other.example").await.unwrap();

        assert_eq!(store.find_code("https://needle.example").await.unwrap(), Some(code));
        assert_eq!(store.find_code("https://missing.example").await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_visits_every_url_exactly_once() {
        let store = PartitionedStore::new(memory_shards(3), SequenceAllocator::new()).unwrap();
        let mut expected = HashSet::new();
        for i in 0..25 {
            let url = format!("https://example.com/{i}");
            store.assign(&url).await.unwrap();
            expected.insert(url);
        }

        let mut seen = vec![];
        let mut cursor = Some(ScanCursor::default());
        while let Some(current) = cursor {
            let page = store.scan_long_urls(current, 4).await.unwrap();
            assert!(page.long_urls.len() <= 4);
            seen.extend(page.long_urls);
            cursor = page.next;
        }

        assert_eq!(seen.len(), 25);
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[tokio::test]
    async fn scan_rejects_zero_limit() {
        let store = single_shard_store();
        let err = store
            .scan_long_urls(ScanCursor::default(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
