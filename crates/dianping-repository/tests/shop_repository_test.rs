//! Integration tests for the MySQL repositories.
//!
//! These tests run against a real MySQL database using testcontainers.
//! Requires Docker to be available on the system.

mod common;

use common::TestDatabase;
use dianping_core::ShopId;
use dianping_repository::{
    MySqlShopRepository, MySqlShopTypeRepository, ShopRepository, ShopTypeRepository,
};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_shop_by_id() {
    let db = TestDatabase::new().await;
    let repo = MySqlShopRepository::new(db.pool());
    let id = db.insert_shop("Kaiyuanli Hotpot").await;

    let shop = repo
        .find_by_id(ShopId(id))
        .await
        .expect("Query failed")
        .expect("Shop not found");

    assert_eq!(shop.name, "Kaiyuanli Hotpot");
    assert_eq!(shop.area.as_deref(), Some("Daguan"));
    assert_eq!(shop.avg_price, Some(80));
    assert_eq!(shop.score, 37);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_find_missing_shop() {
    let db = TestDatabase::new().await;
    let repo = MySqlShopRepository::new(db.pool());

    let result = repo.find_by_id(ShopId(999)).await.expect("Query failed");
    assert!(result.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_shop() {
    let db = TestDatabase::new().await;
    let repo = MySqlShopRepository::new(db.pool());
    let id = db.insert_shop("Before").await;

    let mut shop = repo.find_by_id(ShopId(id)).await.unwrap().unwrap();
    shop.name = "After".to_string();
    shop.sold += 1;
    assert!(repo.update(&shop).await.expect("Update failed"));

    let updated = repo.find_by_id(ShopId(id)).await.unwrap().unwrap();
    assert_eq!(updated.name, "After");
    assert_eq!(updated.sold, shop.sold);

    shop.id = ShopId(id + 1000);
    assert!(!repo.update(&shop).await.expect("Update failed"));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_shop_types_ordered() {
    let db = TestDatabase::new().await;
    let repo = MySqlShopTypeRepository::new(db.pool());
    db.insert_shop_type("KTV", 3).await;
    db.insert_shop_type("Food", 1).await;
    db.insert_shop_type("Hotel", 2).await;

    let names: Vec<String> = repo
        .find_all_ordered()
        .await
        .expect("Query failed")
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["Food", "Hotel", "KTV"]);
}
