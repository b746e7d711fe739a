use linkshard_cache::{BloomFilterConfig, RedisBloomFilter};
use linkshard_core::{FilterScope, MembershipFilter};
use linkshard_test_infra::{RedisConfig, RedisServer};

async fn start_redis_stack() -> (RedisServer, redis::aio::MultiplexedConnection) {
    let redis = RedisServer::new(RedisConfig::stack())
        .await
        .expect("Failed to start Redis Stack container");
    let conn = redis
        .connection()
        .await
        .expect("Failed to get Redis connection");
    (redis, conn)
}

fn config() -> BloomFilterConfig {
    BloomFilterConfig::builder()
        .capacity(10_000)
        .false_positive_rate(0.01)
        .key("test:bloom")
        .build()
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_bloom_add_then_test() {
    let (_redis, conn) = start_redis_stack().await;
    let filter = RedisBloomFilter::new(conn, &config()).await.unwrap();

    assert_eq!(filter.scope(), FilterScope::Shared);
    assert!(!filter.test("https://example.com").await.unwrap());

    filter.add("https://example.com").await.unwrap();
    assert!(filter.test("https://example.com").await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_redis_bloom_is_shared_between_handles() {
    let (_redis, conn) = start_redis_stack().await;
    let first = RedisBloomFilter::new(conn.clone(), &config()).await.unwrap();
    // Reserving an existing key is not an error
    let second = RedisBloomFilter::new(conn, &config()).await.unwrap();

    first.add("https://shared.example").await.unwrap();
    assert!(second.test("https://shared.example").await.unwrap());
}
