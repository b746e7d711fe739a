use async_trait::async_trait;
use linkshard_core::{MembershipFilter, ScanCursor, ShortCode, Store, StoreError, UrlIndex};
use tracing::{debug, info, trace, warn};

type Result<T> = std::result::Result<T, StoreError>;

const REBUILD_PAGE_SIZE: usize = 1_000;

/// A deduplicating assign path in front of a store that can be searched by
/// long URL.
///
/// A negative filter test goes straight to allocation. A positive test is
/// confirmed against the store, since it may be a false positive. Two
/// concurrent assigns of a URL nobody has seen yet can still both allocate.
#[derive(Debug, Clone)]
pub struct FilteredStore<S, F> {
    inner: S,
    filter: F,
}

impl<S, F> FilteredStore<S, F>
where
    S: Store + UrlIndex,
    F: MembershipFilter,
{
    pub fn new(inner: S, filter: F) -> Self {
        Self { inner, filter }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Adds every long URL already in the store to the filter.
    ///
    /// A process-local filter starts empty and must be rebuilt before it
    /// serves traffic, otherwise every existing URL is a false negative.
    /// Returns the number of URLs added.
    pub async fn rebuild(&self) -> Result<usize> {
        let mut added = 0;
        let mut cursor = Some(ScanCursor::default());

        while let Some(current) = cursor {
            let page = self.inner.scan_long_urls(current, REBUILD_PAGE_SIZE).await?;
            for long_url in &page.long_urls {
                self.filter
                    .add(long_url)
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
            added += page.long_urls.len();
            cursor = page.next;
        }

        info!(added, scope = %self.filter.scope(), "Rebuilt membership filter");
        Ok(added)
    }
}

#[async_trait]
impl<S, F> Store for FilteredStore<S, F>
where
    S: Store + UrlIndex,
    F: MembershipFilter,
{
    async fn assign(&self, long_url: &str) -> Result<ShortCode> {
        let maybe_present = match self.filter.test(long_url).await {
            Ok(present) => present,
            Err(e) => {
                // No answer means the URL may exist; ask the store.
                warn!(error = %e, "Filter test failed, confirming with store");
                true
            }
        };

        if maybe_present {
            if let Some(code) = self.inner.find_code(long_url).await? {
                debug!(code = %code, "Reusing existing short code");
                return Ok(code);
            }
            trace!("Filter false positive");
        }

        let code = self.inner.assign(long_url).await?;

        if let Err(e) = self.filter.add(long_url).await {
            warn!(code = %code, error = %e, "Failed to record URL in filter");
        }

        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String> {
        self.inner.resolve(code).await
    }
}
