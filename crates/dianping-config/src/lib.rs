//! # Dianping Config
//!
//! Configuration management for the Dianping cache backend.
//! Supports layered configuration from files and environment variables.

mod app_config;
mod loader;
mod strategy;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use strategy::*;
pub use validation::*;
