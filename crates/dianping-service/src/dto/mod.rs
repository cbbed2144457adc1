//! Data transfer objects for the service layer.

mod shop_dto;

pub use shop_dto::*;
