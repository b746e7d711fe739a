use std::time::Duration;

use linkshard_cache::{LayeredCache, MokaUrlCache, RedisUrlCache};
use linkshard_core::{ShortCode, UrlCache};
use linkshard_test_infra::{RedisConfig, RedisServer};
use redis::AsyncCommands;

const HOUR: Duration = Duration::from_secs(3600);

async fn start_redis() -> (RedisServer, redis::aio::MultiplexedConnection) {
    let redis = RedisServer::new(RedisConfig::default())
        .await
        .expect("Failed to start Redis container");
    let conn = redis
        .connection()
        .await
        .expect("Failed to get Redis connection");
    (redis, conn)
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_basic_get_set() {
    let (_redis, conn) = start_redis().await;
    let cache = RedisUrlCache::new(conn);
    let code = ShortCode::new("test123").unwrap();

    assert!(cache.get_url(&code).await.unwrap().is_none());

    cache.set_url(&code, "https://example.com", HOUR).await.unwrap();

    assert_eq!(
        cache.get_url(&code).await.unwrap().as_deref(),
        Some("https://example.com")
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_stores_plain_string_with_ttl() {
    let (_redis, conn) = start_redis().await;
    let mut raw = conn.clone();
    let cache = RedisUrlCache::new(conn);
    let code = ShortCode::new("abcdefg").unwrap();

    cache.set_url(&code, "https://example.com", HOUR).await.unwrap();

    let stored: Option<String> = raw.get("ls:url:abcdefg").await.unwrap();
    assert_eq!(stored.as_deref(), Some("https://example.com"));

    let ttl: i64 = raw.ttl("ls:url:abcdefg").await.unwrap();
    assert!(ttl > 0 && ttl <= 3600, "unexpected ttl {ttl}");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_entry_expires() {
    let (_redis, conn) = start_redis().await;
    let cache = RedisUrlCache::new(conn);
    let code = ShortCode::new("expire1").unwrap();

    cache
        .set_url(&code, "https://example.com", Duration::from_secs(1))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(cache.get_url(&code).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_cache_delete() {
    let (_redis, conn) = start_redis().await;
    let cache = RedisUrlCache::with_prefix(conn, "test:url:");
    let code = ShortCode::new("delete1").unwrap();

    cache.set_url(&code, "https://example.com", HOUR).await.unwrap();
    cache.del(&code).await.unwrap();
    assert!(cache.get_url(&code).await.unwrap().is_none());

    // Deleting a missing key is fine
    cache.del(&code).await.unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_layered_cache_over_redis() {
    let (_redis, conn) = start_redis().await;
    let cache = LayeredCache::new(MokaUrlCache::new(), RedisUrlCache::new(conn));
    let code = ShortCode::new("layer01").unwrap();

    cache
        .l2()
        .set_url(&code, "https://example.com", HOUR)
        .await
        .unwrap();

    assert_eq!(
        cache.get_url(&code).await.unwrap().as_deref(),
        Some("https://example.com")
    );
    assert!(cache.l1().get_url(&code).await.unwrap().is_some());
}
