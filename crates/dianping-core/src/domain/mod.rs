//! Domain entities for the shop review backend.

pub mod entities;

pub use entities::*;
