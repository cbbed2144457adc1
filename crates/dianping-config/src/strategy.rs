//! Read strategy selection for cached entity lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which cache-aside strategy serves shop lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Null-value caching only. Concurrent misses may each hit the database.
    PassThrough,
    /// Single-flight rebuild behind a store-level mutex.
    Mutex,
    /// Serve stale data and refresh it in the background.
    #[default]
    LogicalExpire,
}

impl ReadStrategy {
    /// Snake-case name, as used in config files and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::Mutex => "mutex",
            Self::LogicalExpire => "logical_expire",
        }
    }
}

impl fmt::Display for ReadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
