//! MySQL repository implementations.

mod shop_repository;
mod shop_type_repository;

pub use shop_repository::MySqlShopRepository;
pub use shop_type_repository::MySqlShopTypeRepository;
