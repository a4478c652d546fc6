//! 经验与头衔的推导规则。经验值不落库，永远由消息数和获赞数现算。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::user::FOUNDER_LOGIN;
use crate::value_objects::Login;

/// 每条消息折算的经验值，奖励消息同样按此计。
pub const XP_PER_MESSAGE: i64 = 5;

/// 自己的消息每收到一个赞折算的经验值。
pub const XP_PER_REACTION: i64 = 10;

/// 创始人账号的固定加成。
pub const FOUNDER_XP_BONUS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankTitle {
    Novice,
    Veteran,
    Major,
}

impl RankTitle {
    /// 阈值从高到低取首个命中，下界包含在内。
    pub fn for_xp(xp: i64) -> Self {
        if xp >= 1000 {
            RankTitle::Major
        } else if xp >= 500 {
            RankTitle::Veteran
        } else {
            RankTitle::Novice
        }
    }

    /// 头衔对应的展示色。
    pub fn accent(self) -> &'static str {
        match self {
            RankTitle::Novice => "#ffffff",
            RankTitle::Veteran => "#44ff44",
            RankTitle::Major => "#ff8800",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RankTitle::Novice => "Novice",
            RankTitle::Veteran => "Veteran",
            RankTitle::Major => "Major",
        }
    }
}

impl fmt::Display for RankTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub xp: i64,
    pub title: RankTitle,
}

impl UserStats {
    pub fn from_counts(login: &Login, messages: u64, reactions_received: u64) -> Self {
        let xp = compute_xp(login, messages, reactions_received);
        Self {
            xp,
            title: RankTitle::for_xp(xp),
        }
    }
}

pub fn compute_xp(login: &Login, messages: u64, reactions_received: u64) -> i64 {
    let mut xp = XP_PER_MESSAGE * messages as i64 + XP_PER_REACTION * reactions_received as i64;
    if login.as_str() == FOUNDER_LOGIN {
        xp += FOUNDER_XP_BONUS;
    }
    xp
}
