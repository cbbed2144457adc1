//! Cache key generators for consistent key naming.
//!
//! Every key is `prefix + id`. The prefixes are part of the shared store
//! contract and must not change between releases.

use dianping_core::ShopId;
use std::fmt::Display;

/// Prefix of cached shop entries.
pub const CACHE_SHOP_KEY: &str = "shop:cache:";
/// Prefix of per-shop rebuild locks.
pub const LOCK_SHOP_KEY: &str = "shop:lock:";
/// Key of the cached shop-type list.
pub const CACHE_SHOP_TYPE_KEY: &str = "shop-type:cache:list";
/// Prefix of login sessions.
pub const LOGIN_USER_KEY: &str = "login:token:";

/// Joins a prefix and an id.
#[must_use]
pub fn cache_key(prefix: &str, id: impl Display) -> String {
    format!("{}{}", prefix, id)
}

/// Cache key of a shop.
#[must_use]
pub fn shop_key(id: ShopId) -> String {
    cache_key(CACHE_SHOP_KEY, id)
}

/// Rebuild lock key of a shop.
#[must_use]
pub fn shop_lock_key(id: ShopId) -> String {
    cache_key(LOCK_SHOP_KEY, id)
}

/// Session key of a login token.
#[must_use]
pub fn login_token_key(token: &str) -> String {
    cache_key(LOGIN_USER_KEY, token)
}
