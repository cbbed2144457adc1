//! Caller identity extractors.
//!
//! Both read the [`RequestContext`] the session middleware stored in the
//! request extensions.

use crate::responses::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use dianping_core::UserDto;
use dianping_service::RequestContext;
use std::convert::Infallible;

/// The request context; anonymous if the middleware did not run.
pub struct Session(pub RequestContext);

impl std::ops::Deref for Session {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        Ok(Session(ctx))
    }
}

/// The logged-in user. Rejects anonymous callers with 401.
pub struct CurrentUser(pub UserDto);

impl std::ops::Deref for CurrentUser {
    type Target = UserDto;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();
        let user = ctx.require_user()?.clone();
        Ok(CurrentUser(user))
    }
}
