// 单进程内的本地广播器实现
use async_trait::async_trait;
use domain::{ChangeEvent, RoomId};
use tokio::sync::broadcast;

use crate::broadcaster::{BroadcastError, ChangeBroadcaster};

#[derive(Clone)]
pub struct LocalChangeBroadcaster {
    sender: broadcast::Sender<ChangeEvent>,
}

impl LocalChangeBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for LocalChangeBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeBroadcaster for LocalChangeBroadcaster {
    async fn publish(&self, event: ChangeEvent) -> Result<(), BroadcastError> {
        // 没有订阅者不算失败，事件本来就是尽力送达。
        let _ = self.sender.send(event);
        Ok(())
    }
}

/// 按房间过滤的事件流。全局事件对所有房间可见。
pub struct EventStream {
    receiver: broadcast::Receiver<ChangeEvent>,
    room_id: Option<RoomId>,
}

impl EventStream {
    pub fn new(receiver: broadcast::Receiver<ChangeEvent>, room_id: Option<RoomId>) -> Self {
        Self { receiver, room_id }
    }

    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => match self.room_id {
                    Some(room_id) if !event.concerns_room(room_id) => continue,
                    _ => return Some(event),
                },
                // 落后的订阅者跳过丢失的事件继续收，订阅方反正会整体重查。
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
