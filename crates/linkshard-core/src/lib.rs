//! Core types and traits for the Linkshard storage pipeline.
//!
//! Every layer of the pipeline (partitioned store, membership filter,
//! read-through cache) implements or consumes the seams defined here, so
//! layers can be stacked in any order.

pub mod allocator;
pub mod base62;
pub mod cache;
pub mod error;
pub mod filter;
pub mod record;
pub mod shortcode;
pub mod store;

pub use allocator::IdAllocator;
pub use cache::UrlCache;
pub use error::{AllocatorError, CacheError, CoreError, FilterError, StoreError};
pub use filter::{FilterScope, MembershipFilter};
pub use record::MappingRecord;
pub use shortcode::ShortCode;
pub use store::{ScanCursor, ScanPage, Store, UrlIndex};
