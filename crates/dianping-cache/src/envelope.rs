//! Logical-expiration envelope.
//!
//! Entries written for the logical-expire strategy never expire in the store.
//! The deadline travels inside the value instead:
//!
//! ```json
//! {"data": {...}, "expireTime": "2026-01-01T00:00:00Z"}
//! ```

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value paired with its logical deadline.
///
/// `data` is `None` when a rebuild found that the entity no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalEnvelope<T> {
    pub data: Option<T>,
    pub expire_time: DateTime<Utc>,
}

impl<T> LogicalEnvelope<T> {
    /// Wraps `data` with a deadline `lease` from now.
    pub fn new(data: Option<T>, lease: Duration) -> Self {
        Self::starting_at(data, lease, Utc::now())
    }

    /// Wraps `data` with a deadline `lease` after `now`.
    pub fn starting_at(data: Option<T>, lease: Duration, now: DateTime<Utc>) -> Self {
        let expire_time = ChronoDuration::from_std(lease)
            .ok()
            .and_then(|lease| now.checked_add_signed(lease))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { data, expire_time }
    }

    /// Returns true if the deadline is at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_time <= now
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_format() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let envelope = LogicalEnvelope::starting_at(Some(42), Duration::from_secs(60), now);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"], 42);
        assert_eq!(json["expireTime"], "2026-01-01T00:01:00Z");
    }

    #[test]
    fn test_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let envelope = LogicalEnvelope::starting_at(Some("a"), Duration::from_secs(10), now);
        assert!(!envelope.is_expired_at(now));
        assert!(envelope.is_expired_at(now + ChronoDuration::seconds(10)));
    }

    #[test]
    fn test_huge_lease_saturates() {
        let envelope = LogicalEnvelope::new(Some(1), Duration::from_secs(u64::MAX));
        assert_eq!(envelope.expire_time, DateTime::<Utc>::MAX_UTC);
        assert!(!envelope.is_expired());
    }

    #[test]
    fn test_null_data_round_trips() {
        let raw = r#"{"data":null,"expireTime":"2026-01-01T00:00:00Z"}"#;
        let envelope: LogicalEnvelope<i64> = serde_json::from_str(raw).unwrap();
        assert!(envelope.data.is_none());
    }
}
