use async_trait::async_trait;
use linkshard_core::{ScanCursor, ScanPage, ShortCode, Store, StoreError, UrlIndex};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

type Result<T> = std::result::Result<T, StoreError>;

/// A single-map store that counts every call that reaches it.
#[derive(Default)]
pub(crate) struct StubStore {
    next_id: AtomicU64,
    records: Mutex<BTreeMap<u64, (ShortCode, String)>>,
    unavailable: AtomicBool,
    assign_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    find_calls: AtomicUsize,
}

impl StubStore {
    pub(crate) fn assign_calls(&self) -> usize {
        self.assign_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("stub store is down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for StubStore {
    async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        self.assign_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let code = ShortCode::from_id(id);
        self.records
            .lock()
            .unwrap()
            .insert(id, (code.clone(), long_url.to_string()));
        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|(c, _)| c == code)
            .map(|(_, url)| url.clone())
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }
}

#[async_trait]
impl UrlIndex for StubStore {
    async fn find_code(&self, long_url: &str) -> Result<Option<ShortCode>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|(_, url)| url == long_url)
            .map(|(code, _)| code.clone()))
    }

    async fn scan_long_urls(&self, cursor: ScanCursor, limit: usize) -> Result<ScanPage> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        let after = cursor.after_id.unwrap_or(0);
        let page: Vec<(u64, String)> = records
            .range(after + 1..)
            .take(limit)
            .map(|(id, (_, url))| (*id, url.clone()))
            .collect();
        let next = match page.last() {
            Some((id, _)) if page.len() == limit => Some(ScanCursor {
                shard: 0,
                after_id: Some(*id),
            }),
            _ => None,
        };
        Ok(ScanPage {
            long_urls: page.into_iter().map(|(_, url)| url).collect(),
            next,
        })
    }
}
