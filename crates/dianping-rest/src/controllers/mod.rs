//! REST API controllers.

pub mod health_controller;
pub mod shop_controller;
pub mod shop_type_controller;
pub mod user_controller;

pub use health_controller::*;
