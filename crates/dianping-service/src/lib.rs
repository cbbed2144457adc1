//! # Dianping Service
//!
//! Business logic service layer. Services combine the repositories with the
//! cache layer and decide which read strategy serves each lookup.

pub mod context;
pub mod dto;
pub mod r#impl;
pub mod session_service;
pub mod shop_service;
pub mod shop_type_service;

pub use context::*;
pub use dto::*;
pub use r#impl::{SessionServiceImpl, ShopCacheSettings, ShopServiceImpl, ShopTypeServiceImpl};
pub use session_service::*;
pub use shop_service::*;
pub use shop_type_service::*;
