//! Integration tests for `RedisCacheStore`.
//!
//! These tests run against a real Redis server using testcontainers.
//! Requires Docker to be available on the system.

use dianping_cache::{create_pool, CacheStore, DistributedLock, RedisCacheStore};
use dianping_config::RedisConfig;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;

async fn start_redis() -> (ContainerAsync<Redis>, RedisCacheStore) {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start Redis container");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get Redis port");

    let config = RedisConfig {
        url: format!("redis://127.0.0.1:{}", port),
        pool_size: 4,
        enabled: true,
    };
    let pool = create_pool(&config).await.expect("Failed to create Redis pool");
    (container, RedisCacheStore::new(pool))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_redis_set_get_and_sentinel() {
    let (_container, store) = start_redis().await;

    store
        .set("shop:cache:14", r#"{"id":14}"#, Some(Duration::from_secs(60)))
        .await
        .unwrap();
    store.set("shop:cache:999", "", Some(Duration::from_secs(120))).await.unwrap();

    assert_eq!(
        store.get("shop:cache:14").await.unwrap().as_deref(),
        Some(r#"{"id":14}"#)
    );
    assert_eq!(store.get("shop:cache:999").await.unwrap().as_deref(), Some(""));
    assert_eq!(store.get("shop:cache:1").await.unwrap(), None);
    assert!(store.ttl("shop:cache:999").await.unwrap().unwrap() <= Duration::from_secs(120));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_redis_lock_semantics() {
    let (_container, store) = start_redis().await;
    let lock = DistributedLock::new(Arc::new(store.clone()));
    let lease = Duration::from_secs(10);

    assert!(lock.try_lock("shop:lock:14", lease).await.unwrap());
    assert!(!lock.try_lock("shop:lock:14", lease).await.unwrap());
    lock.unlock("shop:lock:14").await.unwrap();
    assert!(lock.try_lock("shop:lock:14", lease).await.unwrap());

    let token = lock.try_lock_owned("shop:lock:15", lease).await.unwrap().unwrap();
    assert!(!store.delete_if_equals("shop:lock:15", "someone-else").await.unwrap());
    assert!(lock.unlock_owned(&token).await.unwrap());
    assert_eq!(store.get("shop:lock:15").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_redis_expire_and_delete() {
    let (_container, store) = start_redis().await;

    store.set("login:token:abc", "{}", None).await.unwrap();
    assert_eq!(store.ttl("login:token:abc").await.unwrap(), None);
    assert!(store.expire("login:token:abc", Duration::from_secs(1800)).await.unwrap());
    assert!(store.ttl("login:token:abc").await.unwrap().is_some());
    assert!(store.delete("login:token:abc").await.unwrap());
    assert!(!store.expire("login:token:abc", Duration::from_secs(1)).await.unwrap());
}
