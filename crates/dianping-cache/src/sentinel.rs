//! Null sentinel used to cache "this id does not exist".
//!
//! The sentinel is the empty string. A stored empty string is never a
//! serialized entity, so readers can tell three states apart.

/// Value stored for a confirmed-missing entity.
pub const NULL_SENTINEL: &str = "";

/// Returns the sentinel value to store.
#[must_use]
pub const fn encode_null() -> &'static str {
    NULL_SENTINEL
}

/// Returns true if a stored value is the null sentinel.
#[must_use]
pub fn is_null(raw: &str) -> bool {
    raw == NULL_SENTINEL
}

/// Classification of a raw store read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached {
    /// Key not present.
    Missing,
    /// Key holds the null sentinel.
    Null,
    /// Key holds a serialized value.
    Value(String),
}

impl Cached {
    /// Classifies the result of a `get`.
    #[must_use]
    pub fn classify(raw: Option<String>) -> Self {
        match raw {
            None => Self::Missing,
            Some(raw) if is_null(&raw) => Self::Null,
            Some(raw) => Self::Value(raw),
        }
    }
}
