//! Custom Axum extractors.

mod json;
mod session;

pub use json::*;
pub use session::*;
