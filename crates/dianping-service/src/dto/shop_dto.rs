//! Shop-related DTOs.

use dianping_core::{Shop, ShopTypeId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to update a shop. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    pub id: Option<i64>,

    #[validate(length(min = 1, max = 128, message = "Shop name must be 1-128 characters"))]
    pub name: Option<String>,

    pub type_id: Option<i64>,

    #[validate(length(max = 1024))]
    pub images: Option<String>,

    #[validate(length(max = 128))]
    pub area: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Address must be 1-255 characters"))]
    pub address: Option<String>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub x: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub y: Option<f64>,

    #[validate(range(min = 0, message = "Average price cannot be negative"))]
    pub avg_price: Option<i64>,

    #[validate(range(min = 0))]
    pub sold: Option<i32>,

    #[validate(range(min = 0))]
    pub comments: Option<i32>,

    #[validate(range(min = 0, max = 50, message = "Score must be between 0 and 50"))]
    pub score: Option<i32>,

    #[validate(length(max = 32))]
    pub open_hours: Option<String>,
}

impl UpdateShopRequest {
    /// Copies every present field onto `shop`.
    pub fn apply_to(self, shop: &mut Shop) {
        if let Some(name) = self.name {
            shop.name = name;
        }
        if let Some(type_id) = self.type_id {
            shop.type_id = ShopTypeId(type_id);
        }
        if let Some(images) = self.images {
            shop.images = images;
        }
        if self.area.is_some() {
            shop.area = self.area;
        }
        if let Some(address) = self.address {
            shop.address = address;
        }
        if let Some(x) = self.x {
            shop.x = x;
        }
        if let Some(y) = self.y {
            shop.y = y;
        }
        if self.avg_price.is_some() {
            shop.avg_price = self.avg_price;
        }
        if let Some(sold) = self.sold {
            shop.sold = sold;
        }
        if let Some(comments) = self.comments {
            shop.comments = comments;
        }
        if let Some(score) = self.score {
            shop.score = score;
        }
        if self.open_hours.is_some() {
            shop.open_hours = self.open_hours;
        }
    }
}
