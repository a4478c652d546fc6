//! 变更通知事件。
//!
//! 事件只表达"哪个范围的数据旧了"，订阅方收到后自行重新查询，
//! 事件本身不携带实体数据。

use serde::{Deserialize, Serialize};

use crate::value_objects::RoomId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// 某个房间的消息列表需要重新拉取。
    RoomChanged { room_id: RoomId },

    /// 房间列表、成员、资料、排行榜等全局视图需要刷新。
    GlobalChanged,
}

impl ChangeEvent {
    pub fn room_changed(room_id: RoomId) -> Self {
        ChangeEvent::RoomChanged { room_id }
    }

    pub fn global_changed() -> Self {
        ChangeEvent::GlobalChanged
    }

    /// 房间过滤用：全局事件对任何订阅范围都可见。
    pub fn concerns_room(&self, room_id: RoomId) -> bool {
        match self {
            ChangeEvent::RoomChanged { room_id: changed } => *changed == room_id,
            ChangeEvent::GlobalChanged => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_filter() {
        let event = ChangeEvent::room_changed(RoomId::new(5));
        assert!(event.concerns_room(RoomId::new(5)));
        assert!(!event.concerns_room(RoomId::new(6)));
        assert!(ChangeEvent::global_changed().concerns_room(RoomId::new(5)));
    }

    #[test]
    fn serialized_shape() {
        let event = ChangeEvent::room_changed(RoomId::new(5));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["scope"], "room_changed");
        assert_eq!(json["room_id"], 5);
    }
}
