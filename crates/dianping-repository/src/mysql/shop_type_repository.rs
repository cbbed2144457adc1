//! MySQL shop type repository implementation.

use crate::{traits::ShopTypeRepository, DatabasePool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dianping_core::{DianpingResult, ShopType, ShopTypeId};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// MySQL shop type repository implementation.
#[derive(Clone)]
pub struct MySqlShopTypeRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlShopTypeRepository {
    /// Creates a new MySQL shop type repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ShopTypeRow {
    id: i64,
    name: String,
    icon: String,
    sort: i32,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl From<ShopTypeRow> for ShopType {
    fn from(row: ShopTypeRow) -> Self {
        ShopType {
            id: ShopTypeId(row.id),
            name: row.name,
            icon: row.icon,
            sort: row.sort,
            create_time: row.create_time,
            update_time: row.update_time,
        }
    }
}

#[async_trait]
impl ShopTypeRepository for MySqlShopTypeRepository {
    async fn find_all_ordered(&self) -> DianpingResult<Vec<ShopType>> {
        debug!("Loading shop types");

        let rows = sqlx::query_as::<_, ShopTypeRow>(
            r#"
            SELECT id, name, icon, sort, create_time, update_time
            FROM tb_shop_type
            ORDER BY sort ASC, id ASC
            "#,
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(ShopType::from).collect())
    }
}
