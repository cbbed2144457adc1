//! Session user.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// The slice of a user that is kept in the login session and exposed to
/// handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub nick_name: String,
    #[serde(default)]
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_dto_defaults_missing_icon() {
        let user: UserDto = serde_json::from_str(r#"{"id":1010,"nickName":"user_x1"}"#).unwrap();
        assert_eq!(user.id, UserId(1010));
        assert_eq!(user.nick_name, "user_x1");
        assert!(user.icon.is_empty());
    }
}
