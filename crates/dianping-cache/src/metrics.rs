//! Prometheus metrics for the cache layer.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metric names for the cache layer.
pub mod names {
    /// Reads answered with a cached value.
    pub const CACHE_HITS_TOTAL: &str = "dianping_cache_hits_total";
    /// Reads answered with the null sentinel.
    pub const CACHE_NULL_HITS_TOTAL: &str = "dianping_cache_null_hits_total";
    /// Reads that found nothing cached.
    pub const CACHE_MISSES_TOTAL: &str = "dianping_cache_misses_total";
    /// Logical-expire reads that returned stale data.
    pub const CACHE_STALE_HITS_TOTAL: &str = "dianping_cache_stale_hits_total";
    /// Store operations that failed.
    pub const STORE_ERRORS_TOTAL: &str = "dianping_cache_store_errors_total";

    /// Authoritative reads issued on a miss.
    pub const LOADER_CALLS_TOTAL: &str = "dianping_cache_loader_calls_total";
    /// Authoritative read duration in seconds.
    pub const LOADER_DURATION_SECONDS: &str = "dianping_cache_loader_duration_seconds";

    /// Rebuild locks acquired.
    pub const LOCK_ACQUIRED_TOTAL: &str = "dianping_cache_lock_acquired_total";
    /// Rebuild lock attempts that found the lock held.
    pub const LOCK_CONTENDED_TOTAL: &str = "dianping_cache_lock_contended_total";
    /// Reads that gave up waiting for a lock.
    pub const LOCK_TIMEOUTS_TOTAL: &str = "dianping_cache_lock_timeouts_total";

    /// Rebuild tasks accepted by the scheduler.
    pub const REBUILDS_SUBMITTED_TOTAL: &str = "dianping_cache_rebuilds_submitted_total";
    /// Rebuild tasks rejected by the scheduler.
    pub const REBUILDS_REJECTED_TOTAL: &str = "dianping_cache_rebuilds_rejected_total";
    /// Rebuild tasks finished, by outcome.
    pub const REBUILDS_FINISHED_TOTAL: &str = "dianping_cache_rebuilds_finished_total";
    /// Rebuild task duration in seconds.
    pub const REBUILD_DURATION_SECONDS: &str = "dianping_cache_rebuild_duration_seconds";
    /// Rebuild worker concurrency.
    pub const REBUILD_CONCURRENCY: &str = "dianping_cache_rebuild_concurrency";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Reads answered from the cache");
    describe_counter!(
        names::CACHE_NULL_HITS_TOTAL,
        "Reads answered with the null sentinel"
    );
    describe_counter!(names::CACHE_MISSES_TOTAL, "Reads that found nothing cached");
    describe_counter!(
        names::CACHE_STALE_HITS_TOTAL,
        "Logically expired reads served stale"
    );
    describe_counter!(names::STORE_ERRORS_TOTAL, "Failed cache store operations");

    describe_counter!(
        names::LOADER_CALLS_TOTAL,
        "Authoritative store reads issued by the cache"
    );
    describe_histogram!(
        names::LOADER_DURATION_SECONDS,
        "Authoritative store read duration in seconds"
    );

    describe_counter!(names::LOCK_ACQUIRED_TOTAL, "Rebuild locks acquired");
    describe_counter!(
        names::LOCK_CONTENDED_TOTAL,
        "Rebuild lock attempts that found the lock held"
    );
    describe_counter!(
        names::LOCK_TIMEOUTS_TOTAL,
        "Reads that exhausted their lock retries"
    );

    describe_counter!(
        names::REBUILDS_SUBMITTED_TOTAL,
        "Rebuild tasks accepted by the scheduler"
    );
    describe_counter!(
        names::REBUILDS_REJECTED_TOTAL,
        "Rebuild tasks rejected by the scheduler"
    );
    describe_counter!(
        names::REBUILDS_FINISHED_TOTAL,
        "Rebuild tasks finished, labelled by outcome"
    );
    describe_histogram!(
        names::REBUILD_DURATION_SECONDS,
        "Rebuild task duration in seconds"
    );
    describe_gauge!(names::REBUILD_CONCURRENCY, "Rebuild worker concurrency");
}

/// Cache read and lock metrics recorder.
#[derive(Clone)]
pub struct CacheMetrics;

impl CacheMetrics {
    /// Record a cache hit.
    pub fn hit(strategy: &'static str) {
        counter!(names::CACHE_HITS_TOTAL, "strategy" => strategy).increment(1);
    }

    /// Record a null-sentinel hit.
    pub fn null_hit(strategy: &'static str) {
        counter!(names::CACHE_NULL_HITS_TOTAL, "strategy" => strategy).increment(1);
    }

    /// Record a miss.
    pub fn miss(strategy: &'static str) {
        counter!(names::CACHE_MISSES_TOTAL, "strategy" => strategy).increment(1);
    }

    /// Record a stale logical-expire read.
    pub fn stale_hit() {
        counter!(names::CACHE_STALE_HITS_TOTAL).increment(1);
    }

    /// Record a failed store operation.
    pub fn store_error(operation: &'static str) {
        counter!(names::STORE_ERRORS_TOTAL, "operation" => operation).increment(1);
    }

    /// Record an authoritative read.
    pub fn loader_call(strategy: &'static str, duration: Duration) {
        counter!(names::LOADER_CALLS_TOTAL, "strategy" => strategy).increment(1);
        histogram!(names::LOADER_DURATION_SECONDS, "strategy" => strategy)
            .record(duration.as_secs_f64());
    }

    /// Record a lock attempt.
    pub fn lock_attempt(acquired: bool) {
        if acquired {
            counter!(names::LOCK_ACQUIRED_TOTAL).increment(1);
        } else {
            counter!(names::LOCK_CONTENDED_TOTAL).increment(1);
        }
    }

    /// Record a lock wait that gave up.
    pub fn lock_timeout() {
        counter!(names::LOCK_TIMEOUTS_TOTAL).increment(1);
    }
}

/// Rebuild scheduler metrics recorder.
#[derive(Clone)]
pub struct RebuildMetrics;

impl RebuildMetrics {
    /// Record the configured concurrency.
    pub fn concurrency(concurrency: usize) {
        gauge!(names::REBUILD_CONCURRENCY).set(concurrency as f64);
    }

    /// Record an accepted task.
    pub fn submitted() {
        counter!(names::REBUILDS_SUBMITTED_TOTAL).increment(1);
    }

    /// Record a rejected task.
    pub fn rejected(reason: &'static str) {
        counter!(names::REBUILDS_REJECTED_TOTAL, "reason" => reason).increment(1);
    }

    /// Record a finished task.
    pub fn finished(outcome: &'static str, duration: Duration) {
        counter!(names::REBUILDS_FINISHED_TOTAL, "outcome" => outcome).increment(1);
        histogram!(names::REBUILD_DURATION_SECONDS, "outcome" => outcome)
            .record(duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        register_metrics();
    }

    #[test]
    fn test_recorders_without_exporter() {
        CacheMetrics::hit("mutex");
        CacheMetrics::loader_call("pass_through", Duration::from_millis(3));
        CacheMetrics::lock_attempt(false);
        RebuildMetrics::finished("completed", Duration::from_millis(200));
    }
}
