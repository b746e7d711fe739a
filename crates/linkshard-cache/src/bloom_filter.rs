//! In-process Bloom filter for the deduplicating assign path.
//!
//! A Bloom filter can say with certainty that an item is NOT in a set, or
//! that it MIGHT be (with a configurable false positive rate). The filter
//! here remembers long URLs that already have a code, so most never-seen
//! URLs skip the lookup by long URL entirely.
//!
//! The state lives in this process only. Two instances each holding a
//! [`LocalBloomFilter`] will disagree, which defeats deduplication across
//! instances; use [`RedisBloomFilter`](crate::RedisBloomFilter) there.

use async_trait::async_trait;
use linkshard_core::filter::Result;
use linkshard_core::{FilterError, FilterScope, MembershipFilter};
use parking_lot::RwLock;
use typed_builder::TypedBuilder;

/// Sizing for a Bloom filter.
#[derive(Debug, Clone, TypedBuilder)]
pub struct BloomFilterConfig {
    /// Expected number of items. Setting this too low raises the false
    /// positive rate once the filter fills up.
    #[builder(default = 1_000_000)]
    pub capacity: usize,

    /// Desired false positive rate, strictly between 0.0 and 1.0.
    #[builder(default = 0.01)]
    pub false_positive_rate: f64,

    /// Redis key holding the filter. Ignored by [`LocalBloomFilter`].
    #[builder(default = String::from("ls:bloom:urls"), setter(into))]
    pub key: String,
}

impl Default for BloomFilterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BloomFilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FilterError::Initialization(
                "filter capacity must be positive".to_string(),
            ));
        }
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(FilterError::Initialization(format!(
                "false positive rate must be in (0, 1), got {}",
                self.false_positive_rate
            )));
        }
        Ok(())
    }
}

/// A [`MembershipFilter`] backed by the `bloomfilter` crate.
pub struct LocalBloomFilter {
    bloom: RwLock<bloomfilter::Bloom<str>>,
}

impl LocalBloomFilter {
    /// Creates an empty filter sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Initialization` for a zero capacity or an
    /// out-of-range false positive rate.
    pub fn new(config: &BloomFilterConfig) -> Result<Self> {
        config.validate()?;
        let bloom = bloomfilter::Bloom::new_for_fp_rate(config.capacity, config.false_positive_rate)
            .map_err(|e| FilterError::Initialization(e.to_string()))?;
        Ok(Self {
            bloom: RwLock::new(bloom),
        })
    }
}

#[async_trait]
impl MembershipFilter for LocalBloomFilter {
    async fn add(&self, item: &str) -> Result<()> {
        self.bloom.write().set(item);
        Ok(())
    }

    async fn test(&self, item: &str) -> Result<bool> {
        Ok(self.bloom.read().check(item))
    }

    fn scope(&self) -> FilterScope {
        FilterScope::Local
    }
}
