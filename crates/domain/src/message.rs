use serde::{Deserialize, Serialize};

use crate::role::Role;
use crate::value_objects::{Login, MessageBody, MessageId, RoomId, Timestamp};

/// 奖励消息的正文标记。带此标记的消息不进入房间消息列表，但照常计入经验值。
pub const BONUS_BODY: &str = "Bonus XP";

/// 一次奖励发放插入的消息条数，按 5 经验一条折算成 50 经验。
pub const BONUS_GRANT_MESSAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author: Login,
    /// 发帖时刻的角色快照，之后的角色变更不回写。
    pub author_role: Role,
    pub body: MessageBody,
    pub sent_at: Timestamp,
}

impl Message {
    /// 编辑只替换正文，时间戳保持首次发送时刻。
    pub fn edit(&mut self, body: MessageBody) {
        self.body = body;
    }

    pub fn is_bonus(&self) -> bool {
        self.body.as_str() == BONUS_BODY
    }
}

/// 待插入的消息，id 由存储层分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub author: Login,
    pub author_role: Role,
    pub body: MessageBody,
    pub sent_at: Timestamp,
}

impl NewMessage {
    pub fn new(
        room_id: RoomId,
        author: Login,
        author_role: Role,
        body: MessageBody,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            room_id,
            author,
            author_role,
            body,
            sent_at,
        }
    }

    /// 发给指定用户的一条奖励消息，落在保留房间里。
    pub fn bonus(author: Login, author_role: Role, sent_at: Timestamp) -> Self {
        Self {
            room_id: RoomId::BONUS,
            author,
            author_role,
            body: MessageBody::parse(BONUS_BODY).expect("bonus marker is not empty"),
            sent_at,
        }
    }
}
