//! Process-local repositories.
//!
//! Each keeps a read counter so callers can assert how often the
//! authoritative store was actually consulted.

use crate::traits::{ShopRepository, ShopTypeRepository};
use async_trait::async_trait;
use dianping_core::{DianpingResult, Shop, ShopId, ShopType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory shop repository.
#[derive(Debug, Default)]
pub struct InMemoryShopRepository {
    shops: RwLock<HashMap<ShopId, Shop>>,
    reads: AtomicUsize,
}

impl InMemoryShopRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with `shops`.
    #[must_use]
    pub fn with_shops(shops: impl IntoIterator<Item = Shop>) -> Self {
        let repo = Self::new();
        for shop in shops {
            repo.insert(shop);
        }
        repo
    }

    /// Inserts or replaces a shop.
    pub fn insert(&self, shop: Shop) {
        self.shops.write().insert(shop.id, shop);
    }

    /// Removes a shop.
    pub fn remove(&self, id: ShopId) -> Option<Shop> {
        self.shops.write().remove(&id)
    }

    /// Number of `find_by_id` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShopRepository for InMemoryShopRepository {
    async fn find_by_id(&self, id: ShopId) -> DianpingResult<Option<Shop>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.shops.read().get(&id).cloned())
    }

    async fn update(&self, shop: &Shop) -> DianpingResult<bool> {
        let mut shops = self.shops.write();
        match shops.get_mut(&shop.id) {
            Some(existing) => {
                *existing = shop.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory shop type repository.
#[derive(Debug, Default)]
pub struct InMemoryShopTypeRepository {
    types: RwLock<Vec<ShopType>>,
    reads: AtomicUsize,
}

impl InMemoryShopTypeRepository {
    /// Creates a repository seeded with `types`.
    #[must_use]
    pub fn with_types(types: impl IntoIterator<Item = ShopType>) -> Self {
        Self {
            types: RwLock::new(types.into_iter().collect()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Number of `find_all_ordered` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShopTypeRepository for InMemoryShopTypeRepository {
    async fn find_all_ordered(&self) -> DianpingResult<Vec<ShopType>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut types = self.types.read().clone();
        types.sort_by_key(|t| (t.sort, t.id.0));
        Ok(types)
    }
}
