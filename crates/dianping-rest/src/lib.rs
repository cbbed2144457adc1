//! # Dianping REST
//!
//! REST API layer using Axum for the Dianping cache backend.
//! Provides HTTP endpoints for shops, shop types, the session user and health checks.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
