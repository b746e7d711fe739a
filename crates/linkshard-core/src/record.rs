use crate::shortcode::ShortCode;
use serde::{Deserialize, Serialize};

/// A persisted mapping from a short code to a long URL.
///
/// `id` is the allocator-issued primary key and `short_code` is derived from
/// it, so the pair never changes once the record is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub id: u64,
    pub long_url: String,
    pub short_code: ShortCode,
}

impl MappingRecord {
    /// Builds the record for a freshly allocated id.
    pub fn new(id: u64, long_url: impl Into<String>) -> Self {
        Self {
            id,
            long_url: long_url.into(),
            short_code: ShortCode::from_id(id),
        }
    }
}
