use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::value_objects::{Login, PasswordHash, Timestamp};

/// 创始人登录名。该账号在排名中获得固定加成，并且是唯一可以发放奖励的人。
pub const FOUNDER_LOGIN: &str = "Кирилл Зубик";

/// 创始人的预置口令。首次登录时用它自动建立 Creator 账号。
pub const FOUNDER_PASSWORD: &str = "310713";

/// 创始人账号自动建立时的简介。
pub const FOUNDER_BIO: &str = "The Boss";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: Login,
    #[serde(skip_serializing)] // 密码哈希不暴露给客户端
    pub password: PasswordHash,
    pub bio: String,
    pub role: Role,
    pub mute_until: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl User {
    /// 常规注册，角色固定为 User。
    pub fn register(
        login: Login,
        password: PasswordHash,
        bio: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            login,
            password,
            bio: bio.into(),
            role: Role::User,
            mute_until: None,
            created_at: now,
        }
    }

    /// 创始人首次登录时的自动建档。
    pub fn founder(login: Login, password: PasswordHash, now: Timestamp) -> Self {
        Self {
            login,
            password,
            bio: FOUNDER_BIO.to_owned(),
            role: Role::Creator,
            mute_until: None,
            created_at: now,
        }
    }

    /// 禁言是否仍在生效。过期的禁言只是失效，不会被清除。
    pub fn is_muted(&self, now: Timestamp) -> bool {
        matches!(self.mute_until, Some(until) if now < until)
    }

    pub fn set_mute(&mut self, until: Option<Timestamp>) {
        self.mute_until = until;
    }

    pub fn change_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn update_bio(&mut self, bio: impl Into<String>) {
        self.bio = bio.into();
    }

    pub fn is_founder(&self) -> bool {
        self.login.as_str() == FOUNDER_LOGIN
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn sample_user(now: Timestamp) -> User {
        User::register(
            Login::parse("alice").unwrap(),
            PasswordHash::new("hash").unwrap(),
            "",
            now,
        )
    }

    #[test]
    fn fresh_user_is_not_muted() {
        let now = Utc::now();
        assert!(!sample_user(now).is_muted(now));
    }

    #[test]
    fn active_mute_blocks_and_expired_mute_releases() {
        let now = Utc::now();
        let mut user = sample_user(now);

        user.set_mute(Some(now + Duration::minutes(5)));
        assert!(user.is_muted(now));

        // 过了到期时间后无需任何清理动作。
        assert!(!user.is_muted(now + Duration::minutes(6)));
    }

    #[test]
    fn founder_profile_defaults() {
        let now = Utc::now();
        let user = User::founder(
            Login::parse(FOUNDER_LOGIN).unwrap(),
            PasswordHash::new("hash").unwrap(),
            now,
        );
        assert_eq!(user.role, Role::Creator);
        assert_eq!(user.bio, FOUNDER_BIO);
        assert!(user.is_founder());
    }
}
