//! Service implementations.
//!
//! Trait definitions live in the parent module (e.g. `shop_service.rs`).

mod session_service_impl;
mod shop_service_impl;
mod shop_type_service_impl;

pub use session_service_impl::SessionServiceImpl;
pub use shop_service_impl::{ShopCacheSettings, ShopServiceImpl};
pub use shop_type_service_impl::ShopTypeServiceImpl;
