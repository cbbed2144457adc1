//! # Dianping Server Library
//!
//! Wiring, telemetry and startup utilities for the Dianping server binary.

pub mod app;
pub mod startup;
pub mod telemetry;
