//! Session service implementation.

use crate::session_service::SessionService;
use async_trait::async_trait;
use dianping_cache::keys::login_token_key;
use dianping_cache::{CacheClient, Cached};
use dianping_core::{DianpingResult, UserDto};
use std::time::Duration;
use tracing::{debug, warn};

/// Session service reading login sessions from the cache store.
pub struct SessionServiceImpl {
    cache: CacheClient,
    ttl: Duration,
}

impl SessionServiceImpl {
    /// Creates a session service; every successful lookup extends the
    /// session to `ttl`.
    pub fn new(cache: CacheClient, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

#[async_trait]
impl SessionService for SessionServiceImpl {
    async fn resolve(&self, token: &str) -> DianpingResult<Option<UserDto>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let key = login_token_key(token);

        let raw = match self.cache.read(&key).await? {
            Some(Cached::Value(raw)) => raw,
            Some(Cached::Missing | Cached::Null) | None => return Ok(None),
        };
        let user: UserDto = match serde_json::from_str(&raw) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Unreadable session entry");
                return Ok(None);
            }
        };

        let store = self.cache.store();
        self.cache
            .write_quietly(&key, async { store.expire(&key, self.ttl).await.map(|_| ()) })
            .await?;

        debug!(user_id = %user.id, "Session resolved");
        Ok(Some(user))
    }
}
