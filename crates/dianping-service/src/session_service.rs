//! Session service trait definition.

use async_trait::async_trait;
use dianping_core::{DianpingResult, UserDto};

/// Resolves login tokens to users.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Looks up the user behind `token` and extends the session.
    ///
    /// Blank or unknown tokens yield `None`.
    async fn resolve(&self, token: &str) -> DianpingResult<Option<UserDto>>;
}
