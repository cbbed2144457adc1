//! Shop type entity.

use crate::ShopTypeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shop category shown on the home page, ordered by `sort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopType {
    pub id: ShopTypeId,
    pub name: String,
    pub icon: String,
    pub sort: i32,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}
