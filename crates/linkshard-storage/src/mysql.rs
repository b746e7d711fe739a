use crate::shard::Shard;
use crate::{Result, StoreError};
use async_trait::async_trait;
use linkshard_core::{MappingRecord, ShortCode};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};
use typed_builder::TypedBuilder;

const SCHEMA: &str = include_str!("../ddl/mysql/urls.sql");

/// Connection pool bounds for one shard.
///
/// sqlx has no separate cap on idle connections. The idle count is bounded
/// by `max_connections` and trimmed back to `min_connections` by
/// `idle_timeout`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PoolSettings {
    /// Upper bound on open connections.
    #[builder(default = 100)]
    pub max_connections: u32,
    /// Connections kept open even when idle.
    #[builder(default = 0)]
    pub min_connections: u32,
    /// Idle connections above `min_connections` are closed after this long,
    /// which is what bounds how many stay idle.
    #[builder(default = Duration::from_secs(300))]
    pub idle_timeout: Duration,
    /// Connections are recycled after this long so backend restarts heal.
    #[builder(default = Duration::from_secs(300))]
    pub max_lifetime: Duration,
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PoolSettings {
    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .idle_timeout(Some(self.idle_timeout))
            .max_lifetime(Some(self.max_lifetime))
            .acquire_timeout(self.acquire_timeout)
    }
}

/// A shard stored in one MySQL database, table `urls`.
#[derive(Debug, Clone)]
pub struct MySqlShard {
    pool: MySqlPool,
}

impl MySqlShard {
    /// Creates a shard from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a bounded pool to `database_url`.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = settings
            .pool_options()
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        info!(
            max_connections = settings.max_connections,
            "Connected MySQL shard"
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

fn decode_code(raw: String) -> Result<ShortCode> {
    ShortCode::new(raw).map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn decode_record(row: &MySqlRow) -> Result<MappingRecord> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    Ok(MappingRecord {
        id,
        long_url,
        short_code: decode_code(short_code)?,
    })
}

#[async_trait]
impl Shard for MySqlShard {
    async fn insert(&self, record: &MappingRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO urls (id, short_code, long_url)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.short_code.as_str())
        .bind(record.long_url.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict(record.short_code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT long_url
            FROM urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get::<String, _>("long_url").map_err(map_sqlx_error))
            .transpose()
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<ShortCode>> {
        let row = sqlx::query(
            r#"
            SELECT short_code
            FROM urls
            WHERE long_url = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(long_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("short_code").map_err(map_sqlx_error)?;
        decode_code(raw).map(Some)
    }

    async fn scan(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<MappingRecord>> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, short_code, long_url
            FROM urls
            WHERE ? IS NULL OR id > ?
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(after_id)
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(decode_record).collect()
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("Ensured urls table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_defaults() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 100);
        assert_eq!(settings.min_connections, 0);
        assert_eq!(settings.idle_timeout, Duration::from_secs(300));
        assert_eq!(settings.max_lifetime, Duration::from_secs(300));
        assert_eq!(settings.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn pool_options_bound_idle_connections() {
        let settings = PoolSettings::builder()
            .max_connections(25)
            .min_connections(2)
            .idle_timeout(Duration::from_secs(60))
            .build();
        let options = settings.pool_options();
        assert_eq!(options.get_max_connections(), 25);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn pool_errors_are_transient() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_transient());
        assert!(map_sqlx_error(sqlx::Error::PoolClosed).is_transient());
        assert!(!map_sqlx_error(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn stored_code_must_be_well_formed() {
        assert!(decode_code("0000001".to_string()).is_ok());
        assert!(matches!(
            decode_code("bad".to_string()),
            Err(StoreError::InvalidData(_))
        ));
    }
}
