//! Per-request caller identity.

use dianping_core::{DianpingError, DianpingResult, UserDto};

/// Who is making the current request.
///
/// Built once per request by the session middleware and passed to handlers
/// explicitly.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<UserDto>,
}

impl RequestContext {
    /// Context for an anonymous caller.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    /// Context for a logged-in caller.
    #[must_use]
    pub const fn with_user(user: UserDto) -> Self {
        Self { user: Some(user) }
    }

    /// Returns true if a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Returns the logged-in user or an `Unauthorized` error.
    pub fn require_user(&self) -> DianpingResult<&UserDto> {
        self.user
            .as_ref()
            .ok_or_else(|| DianpingError::unauthorized("login required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dianping_core::UserId;

    #[test]
    fn test_require_user() {
        let anonymous = RequestContext::anonymous();
        assert!(!anonymous.is_authenticated());
        assert_eq!(anonymous.require_user().unwrap_err().status_code(), 401);

        let ctx = RequestContext::with_user(UserDto {
            id: UserId(1010),
            nick_name: "user_x1".to_string(),
            icon: String::new(),
        });
        assert_eq!(ctx.require_user().unwrap().id, UserId(1010));
    }
}
