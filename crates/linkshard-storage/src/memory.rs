use crate::shard::Shard;
use crate::{Result, StoreError};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use linkshard_core::{MappingRecord, ShortCode};

/// In-memory shard backed by `DashMap`.
///
/// Enforces the same uniqueness as the MySQL table: one row per id and one
/// row per short code.
#[derive(Debug, Default)]
pub struct InMemoryShard {
    by_code: DashMap<String, MappingRecord>,
    by_id: DashMap<u64, ShortCode>,
}

impl InMemoryShard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[async_trait]
impl Shard for InMemoryShard {
    async fn insert(&self, record: &MappingRecord) -> Result<()> {
        // Lock order is always id then code.
        let Entry::Vacant(id_slot) = self.by_id.entry(record.id) else {
            return Err(StoreError::Conflict(format!("id {}", record.id)));
        };
        match self.by_code.entry(record.short_code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(record.short_code.to_string())),
            Entry::Vacant(code_slot) => {
                code_slot.insert(record.clone());
                id_slot.insert(record.short_code.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        Ok(self
            .by_code
            .get(code.as_str())
            .map(|record| record.long_url.clone()))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
        Ok(self
            .by_code
            .iter()
            .filter(|record| record.long_url == long_url)
            .min_by_key(|record| record.id)
            .map(|record| record.short_code.clone()))
    }

    async fn scan(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<MappingRecord>> {
        let mut records: Vec<MappingRecord> = self
            .by_code
            .iter()
            .filter(|record| after_id.is_none_or(|after| record.id > after))
            .map(|record| record.value().clone())
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        records.truncate(limit);
        Ok(records)
    }
}
