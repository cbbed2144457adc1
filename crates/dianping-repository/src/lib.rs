//! # Dianping Repository
//!
//! Authoritative storage for shops and shop types.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn ShopRepository>      (domain interface)
//! MySqlShopRepository               (SQLx)
//!   ↓
//! MySQL (tb_shop, tb_shop_type)
//! ```
//!
//! [`memory`] holds process-local implementations of the same traits for
//! tests and local runs without a database.

pub mod memory;
pub mod mysql;
pub mod pool;
pub mod traits;

pub use memory::{InMemoryShopRepository, InMemoryShopTypeRepository};
pub use mysql::*;
pub use pool::*;
pub use traits::*;
