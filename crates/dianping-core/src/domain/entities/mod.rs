//! Entities owned by the authoritative store.

mod shop;
mod shop_type;
mod user;

pub use shop::Shop;
pub use shop_type::ShopType;
pub use user::UserDto;
