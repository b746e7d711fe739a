use crate::cached::CachedStore;
use crate::error::PipelineError;
use crate::filtered::FilteredStore;
use crate::settings::{CacheBackend, FilterBackend, PipelineSettings, ShardTarget};
use linkshard_cache::{LayeredCache, LocalBloomFilter, MokaUrlCache, RedisBloomFilter, RedisUrlCache};
use linkshard_core::{FilterScope, MembershipFilter, Store, UrlCache};
use linkshard_flake::{Flake, FlakeSettings};
use linkshard_storage::{InMemoryShard, MySqlShard, PartitionedStore, Shard};
use std::sync::Arc;
use tracing::{info, warn};

type Result<T> = std::result::Result<T, PipelineError>;

/// Opens every configured shard, in order.
pub async fn connect_shards(settings: &PipelineSettings) -> Result<Vec<Arc<dyn Shard>>> {
    let mut shards: Vec<Arc<dyn Shard>> = Vec::with_capacity(settings.shards.len());
    for (idx, target) in settings.shards.iter().enumerate() {
        let shard: Arc<dyn Shard> = match target {
            ShardTarget::InMemory => Arc::new(InMemoryShard::new()),
            ShardTarget::MySql(url) => Arc::new(MySqlShard::connect(url, &settings.pool).await?),
        };
        info!(shard = idx, target = %target, "Shard ready");
        shards.push(shard);
    }
    Ok(shards)
}

async fn build_cache(settings: &PipelineSettings) -> Result<Option<Arc<dyn UrlCache>>> {
    let cache: Arc<dyn UrlCache> = match &settings.cache {
        CacheBackend::Disabled => return Ok(None),
        CacheBackend::Memory { capacity } => Arc::new(MokaUrlCache::with_capacity(*capacity)),
        CacheBackend::Redis { url } => Arc::new(RedisUrlCache::connect(url).await?),
        CacheBackend::Layered { capacity, url } => Arc::new(LayeredCache::new(
            MokaUrlCache::with_capacity(*capacity),
            RedisUrlCache::connect(url).await?,
        )),
    };
    Ok(Some(cache))
}

async fn build_filter(settings: &PipelineSettings) -> Result<Arc<dyn MembershipFilter>> {
    let filter: Arc<dyn MembershipFilter> = match &settings.filter {
        FilterBackend::Local => Arc::new(LocalBloomFilter::new(&settings.bloom)?),
        FilterBackend::Redis { url } => {
            Arc::new(RedisBloomFilter::connect(url, &settings.bloom).await?)
        }
    };
    Ok(filter)
}

/// Assembles `Cached? -> Filtered? -> Partitioned` from `settings`.
///
/// The filter layer is present only in dedupe mode. A local filter is
/// rebuilt from the shards before the pipeline is returned.
pub async fn build_pipeline(settings: &PipelineSettings) -> Result<Arc<dyn Store>> {
    settings.validate()?;

    let shards = connect_shards(settings).await?;
    let allocator = Flake::new(
        FlakeSettings::builder()
            .node_id(settings.node_id)
            .start_epoch(settings.epoch)
            .tick(settings.tick)
            .max_wait(settings.max_wait)
            .build(),
    )?;
    let partitioned = PartitionedStore::new(shards, allocator)?;

    let store: Arc<dyn Store> = if settings.dedupe {
        let filtered = FilteredStore::new(partitioned, build_filter(settings).await?);
        if filtered.filter().scope() == FilterScope::Local {
            warn!("Local membership filter is only correct with a single instance");
            filtered.rebuild().await?;
        }
        Arc::new(filtered)
    } else {
        Arc::new(partitioned)
    };

    let Some(cache) = build_cache(settings).await? else {
        info!(
            shards = settings.shards.len(),
            dedupe = settings.dedupe,
            "Pipeline ready without cache"
        );
        return Ok(store);
    };

    info!(
        shards = settings.shards.len(),
        dedupe = settings.dedupe,
        ttl = ?settings.cache_ttl,
        "Pipeline ready"
    );
    Ok(Arc::new(CachedStore::new(store, cache, settings.cache_ttl)))
}
