//! End-to-end wiring over in-memory backends.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use dianping_cache::{CacheStore, MemoryCacheStore};
use dianping_config::{AppConfig, ReadStrategy};
use dianping_core::{HealthCheck, Shop, ShopId, ShopTypeId};
use dianping_repository::{InMemoryShopRepository, InMemoryShopTypeRepository};
use dianping_server::app::{Application, Components};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

fn shop(id: i64) -> Shop {
    let now = Utc::now();
    Shop {
        id: ShopId(id),
        name: "Xingfu Tea House".to_string(),
        type_id: ShopTypeId(2),
        images: String::new(),
        area: Some("Yundong".to_string()),
        address: "No. 8 Shixiang Road".to_string(),
        x: 120.13,
        y: 30.32,
        avg_price: Some(45),
        sold: 120,
        comments: 88,
        score: 42,
        open_hours: None,
        create_time: now,
        update_time: now,
    }
}

fn components(shops: Arc<InMemoryShopRepository>, store: Arc<MemoryCacheStore>) -> Components {
    let check: Arc<dyn HealthCheck> = store.clone();
    Components {
        shop_repository: shops,
        shop_type_repository: Arc::new(InMemoryShopTypeRepository::with_types([])),
        cache_store: store,
        health_checks: vec![check],
    }
}

#[tokio::test]
async fn test_application_serves_cached_shop() {
    let mut config = AppConfig::default();
    config.cache.strategy = ReadStrategy::Mutex;

    let shops = Arc::new(InMemoryShopRepository::with_shops([shop(14)]));
    let store = Arc::new(MemoryCacheStore::new());
    let app = Application::new(config, components(shops.clone(), store.clone()), None).unwrap();

    for _ in 0..3 {
        let response = app
            .router()
            .oneshot(Request::builder().uri("/api/v1/shop/14").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"]["name"], "Xingfu Tea House");
    }

    assert_eq!(shops.reads(), 1);
    assert!(store.get("shop:cache:14").await.unwrap().is_some());
    assert!(app.cache().scheduler().is_running());
}

#[tokio::test]
async fn test_empty_shop_type_list_is_rejected() {
    let shops = Arc::new(InMemoryShopRepository::new());
    let store = Arc::new(MemoryCacheStore::new());
    let app = Application::new(AppConfig::default(), components(shops, store), None).unwrap();

    let response = app
        .router()
        .oneshot(Request::builder().uri("/api/v1/shop-type/list").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_token_header_is_a_configuration_error() {
    let mut config = AppConfig::default();
    config.session.token_header = "bad header".to_string();

    let result = Application::new(
        config,
        components(Arc::new(InMemoryShopRepository::new()), Arc::new(MemoryCacheStore::new())),
        None,
    );
    assert_eq!(result.err().unwrap().error_code(), "CONFIGURATION_ERROR");
}
