use serde::{Deserialize, Serialize};

use crate::value_objects::{Login, RoomId, Timestamp};

/// 私有聊天室的成员关系。公共聊天室不落成员记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub room_id: RoomId,
    pub login: Login,
    pub joined_at: Timestamp,
}

impl Membership {
    pub fn new(room_id: RoomId, login: Login, now: Timestamp) -> Self {
        Self {
            room_id,
            login,
            joined_at: now,
        }
    }
}
