//! Result type aliases for Dianping.

use crate::DianpingError;

/// A specialized `Result` type for Dianping operations.
pub type DianpingResult<T> = Result<T, DianpingError>;
