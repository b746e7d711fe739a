//! The layered Linkshard pipeline.
//!
//! Layers are plain [`Store`](linkshard_core::Store) decorators composed by
//! construction: `CachedStore<FilteredStore<PartitionedStore>>`, or any
//! subset of it. [`build_pipeline`] assembles the chain from
//! [`PipelineSettings`].

pub mod builder;
pub mod cached;
pub mod error;
pub mod filtered;
pub mod service;
pub mod settings;

pub use builder::{build_pipeline, connect_shards};
pub use cached::CachedStore;
pub use error::PipelineError;
pub use filtered::FilteredStore;
pub use service::LinkService;
pub use settings::{CacheBackend, FilterBackend, PipelineSettings, ShardTarget};

#[cfg(test)]
pub(crate) mod testing;
