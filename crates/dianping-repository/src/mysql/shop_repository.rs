//! MySQL shop repository implementation.

use crate::{traits::ShopRepository, DatabasePool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dianping_core::{DianpingError, DianpingResult, Shop, ShopId, ShopTypeId};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// MySQL shop repository implementation.
#[derive(Clone)]
pub struct MySqlShopRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlShopRepository {
    /// Creates a new MySQL shop repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

/// Database row representation of a shop.
#[derive(Debug, FromRow)]
struct ShopRow {
    id: i64,
    name: String,
    type_id: i64,
    images: String,
    area: Option<String>,
    address: String,
    x: f64,
    y: f64,
    avg_price: Option<i64>,
    sold: i32,
    comments: i32,
    score: i32,
    open_hours: Option<String>,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl TryFrom<ShopRow> for Shop {
    type Error = DianpingError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        if row.id <= 0 {
            return Err(DianpingError::Internal(format!(
                "Invalid shop id in database: {}",
                row.id
            )));
        }

        Ok(Shop {
            id: ShopId(row.id),
            name: row.name,
            type_id: ShopTypeId(row.type_id),
            images: row.images,
            area: row.area,
            address: row.address,
            x: row.x,
            y: row.y,
            avg_price: row.avg_price,
            sold: row.sold,
            comments: row.comments,
            score: row.score,
            open_hours: row.open_hours,
            create_time: row.create_time,
            update_time: row.update_time,
        })
    }
}

#[async_trait]
impl ShopRepository for MySqlShopRepository {
    async fn find_by_id(&self, id: ShopId) -> DianpingResult<Option<Shop>> {
        debug!("Finding shop by id: {}", id);

        let row = sqlx::query_as::<_, ShopRow>(
            r#"
            SELECT id, name, type_id, images, area, address, x, y, avg_price,
                   sold, comments, score, open_hours, create_time, update_time
            FROM tb_shop
            WHERE id = ?
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Shop::try_from).transpose()
    }

    async fn update(&self, shop: &Shop) -> DianpingResult<bool> {
        debug!("Updating shop: {}", shop.id);

        let result = sqlx::query(
            r#"
            UPDATE tb_shop
            SET name = ?, type_id = ?, images = ?, area = ?, address = ?, x = ?, y = ?,
                avg_price = ?, sold = ?, comments = ?, score = ?, open_hours = ?,
                update_time = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&shop.name)
        .bind(shop.type_id.0)
        .bind(&shop.images)
        .bind(&shop.area)
        .bind(&shop.address)
        .bind(shop.x)
        .bind(shop.y)
        .bind(shop.avg_price)
        .bind(shop.sold)
        .bind(shop.comments)
        .bind(shop.score)
        .bind(&shop.open_hours)
        .bind(shop.id.into_inner())
        .execute(self.pool.inner())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
