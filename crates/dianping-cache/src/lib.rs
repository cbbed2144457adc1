//! # Dianping Cache
//!
//! Cache-aside layer in front of the shop database.
//!
//! ## Overview
//!
//! - **Store**: [`CacheStore`] abstracts the key-value store, with Redis and
//!   in-memory implementations.
//! - **Read paths**: [`CacheClient`] implements null caching, mutex-protected
//!   rebuilds and logical expiration.
//! - **Rebuilds**: [`RebuildScheduler`] runs background refreshes on a bounded
//!   worker pool and reports every outcome.

pub mod client;
pub mod envelope;
pub mod keys;
pub mod lock;
pub mod metrics;
pub mod rebuild;
pub mod sentinel;
pub mod store;

pub use client::{CacheClient, CacheOptions, Lookup};
pub use envelope::LogicalEnvelope;
pub use lock::{DistributedLock, LockToken};
pub use rebuild::{
    RebuildError, RebuildEvent, RebuildOutcome, RebuildScheduler, RebuildSchedulerConfig,
    RebuildStats, RebuildTask,
};
pub use sentinel::{Cached, NULL_SENTINEL};
pub use store::{create_pool, CacheStore, MemoryCacheStore, RedisCacheStore};
