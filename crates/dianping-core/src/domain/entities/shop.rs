//! Shop entity.

use crate::{Entity, ShopId, ShopTypeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shop listed on the review platform.
///
/// This is the hot read path of the backend and the payload the cache layer
/// stores under `shop:cache:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub type_id: ShopTypeId,
    /// Comma-separated image URLs.
    pub images: String,
    /// Business district, e.g. "Daguan".
    pub area: Option<String>,
    pub address: String,
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
    /// Average spend per customer, in yuan.
    pub avg_price: Option<i64>,
    pub sold: i32,
    pub comments: i32,
    /// Rating multiplied by ten (1-5 stars becomes 10-50).
    pub score: i32,
    /// Opening hours, e.g. "10:00-22:00".
    pub open_hours: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Entity<ShopId> for Shop {
    fn id(&self) -> &ShopId {
        &self.id
    }
}

impl Shop {
    /// Returns the shop's star rating on a 0.0-5.0 scale.
    #[must_use]
    pub fn stars(&self) -> f64 {
        f64::from(self.score) / 10.0
    }
}
