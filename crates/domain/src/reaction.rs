use serde::{Deserialize, Serialize};

use crate::value_objects::{Login, MessageId};

/// 点赞记录。每个 (消息, 用户) 组合至多一条，随消息删除一并清除。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub login: Login,
}

impl Reaction {
    pub fn new(message_id: MessageId, login: Login) -> Self {
        Self { message_id, login }
    }
}
