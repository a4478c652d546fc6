use domain::{Message, RankTitle, Role, Room, RoomKind, Timestamp, User, UserStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub login: String,
    pub role: Role,
    pub bio: String,
    pub created_at: Timestamp,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.as_str().to_owned(),
            role: user.role,
            bio: user.bio.clone(),
            created_at: user.created_at,
        }
    }
}

/// 登录成功后的会话身份。每次调用都由调用方携带，服务端不保存会话。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub login: String,
    pub role: Role,
    pub bio: String,
}

impl From<&User> for SessionDto {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.as_str().to_owned(),
            role: user.role,
            bio: user.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: i64,
    pub name: String,
    pub creator: String,
    pub kind: RoomKind,
    pub created_at: Timestamp,
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.into(),
            name: room.name.clone(),
            creator: room.creator.as_str().to_owned(),
            kind: room.kind,
            created_at: room.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: i64,
    pub room_id: i64,
    pub author: String,
    pub author_role: Role,
    pub body: String,
    pub sent_at: Timestamp,
    pub like_count: u64,
    pub liked_by_me: bool,
}

impl MessageDto {
    pub fn new(message: &Message, like_count: u64, liked_by_me: bool) -> Self {
        Self {
            id: message.id.into(),
            room_id: message.room_id.into(),
            author: message.author.as_str().to_owned(),
            author_role: message.author_role,
            body: message.body.as_str().to_owned(),
            sent_at: message.sent_at,
            like_count,
            liked_by_me,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    pub login: String,
    pub role: Role,
    pub bio: String,
    pub xp: i64,
    pub title: RankTitle,
    pub accent: String,
}

impl ProfileDto {
    pub fn new(user: &User, stats: UserStats) -> Self {
        Self {
            login: user.login.as_str().to_owned(),
            role: user.role,
            bio: user.bio.clone(),
            xp: stats.xp,
            title: stats.title,
            accent: stats.title.accent().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntryDto {
    pub login: String,
    pub xp: i64,
}
