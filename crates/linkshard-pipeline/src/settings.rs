use crate::error::PipelineError;
use jiff::Timestamp;
use linkshard_cache::BloomFilterConfig;
use linkshard_storage::PoolSettings;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// 2024-01-01T00:00:00Z, the default zero point for allocator ticks.
pub const DEFAULT_EPOCH_SECONDS: i64 = 1_704_067_200;

fn default_epoch() -> Timestamp {
    Timestamp::from_second(DEFAULT_EPOCH_SECONDS).unwrap_or(Timestamp::UNIX_EPOCH)
}

/// Where one shard lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardTarget {
    /// A process-local map; contents are lost on exit.
    InMemory,
    /// A MySQL database URL.
    MySql(String),
}

impl FromStr for ShardTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "memory" || s == "memory://" {
            Ok(ShardTarget::InMemory)
        } else if s.starts_with("mysql://") {
            Ok(ShardTarget::MySql(s.to_string()))
        } else {
            Err(format!(
                "unsupported shard target '{s}'; expected mysql://... or memory"
            ))
        }
    }
}

impl Display for ShardTarget {
    /// Never prints credentials.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardTarget::InMemory => write!(f, "memory"),
            ShardTarget::MySql(url) => {
                let host = url
                    .trim_start_matches("mysql://")
                    .rsplit('@')
                    .next()
                    .unwrap_or_default();
                write!(f, "mysql://{host}")
            }
        }
    }
}

/// Which cache sits in front of the store, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheBackend {
    #[default]
    Disabled,
    Memory { capacity: u64 },
    Redis { url: String },
    /// Moka L1 in front of Redis L2.
    Layered { capacity: u64, url: String },
}

/// Where the membership filter state lives in dedupe mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterBackend {
    /// Per process; rebuilt from the store at startup. Single instance only.
    #[default]
    Local,
    /// RedisBloom key shared by every instance.
    Redis { url: String },
}

/// Everything needed to assemble a pipeline.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PipelineSettings {
    /// One entry per shard. Order matters: a code's shard is its index here.
    pub shards: Vec<ShardTarget>,
    #[builder(default)]
    pub pool: PoolSettings,

    /// Allocator node id, unique per running instance.
    #[builder(default = 0)]
    pub node_id: u8,
    #[builder(default = default_epoch())]
    pub epoch: Timestamp,
    #[builder(default = Duration::from_secs(1))]
    pub tick: Duration,
    #[builder(default = Duration::from_secs(2))]
    pub max_wait: Duration,

    #[builder(default)]
    pub cache: CacheBackend,
    #[builder(default = Duration::from_secs(3600))]
    pub cache_ttl: Duration,

    /// Return the existing code for an already shortened URL. Single shard only.
    #[builder(default = false)]
    pub dedupe: bool,
    #[builder(default)]
    pub filter: FilterBackend,
    #[builder(default)]
    pub bloom: BloomFilterConfig,
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.shards.is_empty() {
            return Err(PipelineError::Config(
                "at least one shard is required".to_string(),
            ));
        }
        if self.dedupe && self.shards.len() > 1 {
            return Err(PipelineError::Config(format!(
                "dedupe needs a single shard, got {}; sharded assign always mints a new code",
                self.shards.len()
            )));
        }
        if self.cache_ttl.is_zero() {
            return Err(PipelineError::Config(
                "cache TTL must be positive".to_string(),
            ));
        }
        if self.node_id > 7 {
            return Err(PipelineError::Config(format!(
                "node id must be in 0..=7, got {}",
                self.node_id
            )));
        }
        self.bloom.validate()?;
        Ok(())
    }
}
