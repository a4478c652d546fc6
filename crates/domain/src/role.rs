use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// 用户角色。变体顺序即权限高低，Guest 最低，Creator 最高。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    Guest,
    User,
    Admin,
    Creator,
}

impl Role {
    /// 是否拥有管理权限（跨用户删除消息、禁言等）。
    pub fn has_moderator_access(self) -> bool {
        matches!(self, Role::Admin | Role::Creator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "Guest",
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Creator => "Creator",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "Guest" => Ok(Role::Guest),
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            "Creator" => Ok(Role::Creator),
            _ => Err(DomainError::invalid_argument("role", "unknown role")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_ordering() {
        assert!(Role::Guest < Role::User);
        assert!(Role::User < Role::Admin);
        assert!(Role::Admin < Role::Creator);
    }

    #[test]
    fn moderator_access() {
        assert!(!Role::Guest.has_moderator_access());
        assert!(!Role::User.has_moderator_access());
        assert!(Role::Admin.has_moderator_access());
        assert!(Role::Creator.has_moderator_access());
    }

    #[test]
    fn parse_round_trip() {
        for role in [Role::Guest, Role::User, Role::Admin, Role::Creator] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("Owner").is_err());
    }
}
