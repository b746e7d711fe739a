use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use linkshard_cache::BloomFilterConfig;
use linkshard_pipeline::{CacheBackend, FilterBackend, PipelineSettings, ShardTarget};
use linkshard_storage::PoolSettings;
use linkshard_telemetry::{LogFormat, TelemetrySettings};
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub const SHARDS_ENV: &str = "LINKSHARD_SHARDS";
pub const MAX_CONNECTIONS_ENV: &str = "LINKSHARD_MAX_CONNECTIONS";
pub const NODE_ID_ENV: &str = "LINKSHARD_NODE_ID";
pub const EPOCH_ENV: &str = "LINKSHARD_EPOCH";
pub const CACHE_ENV: &str = "LINKSHARD_CACHE";
pub const CACHE_CAPACITY_ENV: &str = "LINKSHARD_CACHE_CAPACITY";
pub const CACHE_TTL_ENV: &str = "LINKSHARD_CACHE_TTL_SECS";
pub const REDIS_URL_ENV: &str = "LINKSHARD_REDIS_URL";
pub const DEDUPE_ENV: &str = "LINKSHARD_DEDUPE";
pub const FILTER_ENV: &str = "LINKSHARD_FILTER";
pub const FILTER_CAPACITY_ENV: &str = "LINKSHARD_FILTER_CAPACITY";
pub const FILTER_FP_RATE_ENV: &str = "LINKSHARD_FILTER_FP_RATE";
pub const FILTER_KEY_ENV: &str = "LINKSHARD_FILTER_KEY";
pub const LOG_FORMAT_ENV: &str = "LINKSHARD_LOG_FORMAT";
pub const LOG_FILTER_ENV: &str = "LINKSHARD_LOG";
pub const OTLP_ENDPOINT_ENV: &str = "LINKSHARD_OTLP_ENDPOINT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheArg {
    #[value(name = "none")]
    None,
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
    #[value(name = "layered")]
    Layered,
}

impl Display for CacheArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheArg::None => write!(f, "none"),
            CacheArg::Memory => write!(f, "memory"),
            CacheArg::Redis => write!(f, "redis"),
            CacheArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    #[value(name = "local")]
    Local,
    #[value(name = "redis")]
    Redis,
}

impl Display for FilterArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterArg::Local => write!(f, "local"),
            FilterArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mint a short code for a long URL.
    Assign { long_url: String },
    /// Print the long URL behind a short code.
    Resolve { code: String },
    /// Create the `urls` table on every shard.
    Migrate,
    /// Print the index of the shard that owns a short code.
    Route { code: String },
}

#[derive(Debug, Parser)]
#[command(name = "linkshard", version)]
pub struct CLI {
    /// Shard targets in routing order (`mysql://...` or `memory`).
    #[arg(
        long = "shard",
        env = SHARDS_ENV,
        value_delimiter = ',',
        required = true
    )]
    pub shards: Vec<ShardTarget>,

    #[arg(long, env = MAX_CONNECTIONS_ENV, default_value_t = 100)]
    pub max_connections: u32,

    #[arg(long, env = NODE_ID_ENV, default_value_t = 0)]
    pub node_id: u8,

    /// Allocator epoch, e.g. `2024-01-01T00:00:00Z`.
    #[arg(long, env = EPOCH_ENV)]
    pub epoch: Option<Timestamp>,

    #[arg(long, env = CACHE_ENV, value_enum, default_value_t = CacheArg::None)]
    pub cache: CacheArg,

    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub cache_capacity: u64,

    #[arg(long, env = CACHE_TTL_ENV, default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered"), ("filter", "redis")])
    )]
    pub redis_url: Option<String>,

    /// Return the existing code for an already shortened URL (single shard only).
    #[arg(long, env = DEDUPE_ENV)]
    pub dedupe: bool,

    #[arg(long, env = FILTER_ENV, value_enum, default_value_t = FilterArg::Local)]
    pub filter: FilterArg,

    #[arg(long, env = FILTER_CAPACITY_ENV, default_value_t = 1_000_000)]
    pub filter_capacity: usize,

    #[arg(long, env = FILTER_FP_RATE_ENV, default_value_t = 0.01)]
    pub filter_fp_rate: f64,

    #[arg(long, env = FILTER_KEY_ENV, default_value = "ls:bloom:urls")]
    pub filter_key: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Log filter directives; overrides `RUST_LOG`.
    #[arg(long, env = LOG_FILTER_ENV)]
    pub log: Option<String>,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl CLI {
    pub fn telemetry_settings(&self) -> TelemetrySettings {
        TelemetrySettings {
            service_name: "linkshard".to_string(),
            format: self.log_format,
            filter: self.log.clone(),
            otlp_endpoint: self.otlp_endpoint.clone(),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        let redis_url = self.redis_url.clone().unwrap_or_default();

        let cache = match self.cache {
            CacheArg::None => CacheBackend::Disabled,
            CacheArg::Memory => CacheBackend::Memory {
                capacity: self.cache_capacity,
            },
            CacheArg::Redis => CacheBackend::Redis { url: redis_url.clone() },
            CacheArg::Layered => CacheBackend::Layered {
                capacity: self.cache_capacity,
                url: redis_url.clone(),
            },
        };
        let filter = match self.filter {
            FilterArg::Local => FilterBackend::Local,
            FilterArg::Redis => FilterBackend::Redis { url: redis_url },
        };

        let settings = PipelineSettings::builder()
            .shards(self.shards.clone())
            .pool(
                PoolSettings::builder()
                    .max_connections(self.max_connections)
                    .build(),
            )
            .node_id(self.node_id)
            .cache(cache)
            .cache_ttl(Duration::from_secs(self.cache_ttl_secs))
            .dedupe(self.dedupe)
            .filter(filter)
            .bloom(
                BloomFilterConfig::builder()
                    .capacity(self.filter_capacity)
                    .false_positive_rate(self.filter_fp_rate)
                    .key(self.filter_key.clone())
                    .build(),
            )
            .build();

        match self.epoch {
            Some(epoch) => PipelineSettings { epoch, ..settings },
            None => settings,
        }
    }
}
