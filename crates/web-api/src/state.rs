use std::sync::Arc;

use application::{
    LocalChangeBroadcaster, MessageService, RankingService, RoomService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub room_service: Arc<RoomService>,
    pub message_service: Arc<MessageService>,
    pub ranking_service: Arc<RankingService>,
    /// WebSocket 订阅需要具体类型拿到接收端，不走 trait 对象。
    pub broadcaster: Arc<LocalChangeBroadcaster>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        room_service: Arc<RoomService>,
        message_service: Arc<MessageService>,
        ranking_service: Arc<RankingService>,
        broadcaster: Arc<LocalChangeBroadcaster>,
    ) -> Self {
        Self {
            user_service,
            room_service,
            message_service,
            ranking_service,
            broadcaster,
        }
    }
}
