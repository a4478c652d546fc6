use std::sync::Arc;

use domain::ChangeEvent;

use crate::broadcaster::ChangeBroadcaster;

mod message_service;
mod ranking_service;
mod room_service;
mod user_service;

#[cfg(test)]
mod support;


pub use message_service::{
    DeleteMessageRequest, EditMessageRequest, MessageService, MessageServiceDependencies,
    PostMessageRequest, ToggleReactionRequest,
};
pub use ranking_service::{GrantBonusRequest, RankingService, RankingServiceDependencies};
pub use room_service::{
    CreateRoomRequest, LeaveRoomRequest, RoomService, RoomServiceDependencies,
};
pub use user_service::{
    AuthenticateRequest, RegisterRequest, SetMuteRequest, SetRoleRequest, UpdateBioRequest,
    UserService, UserServiceDependencies,
};

/// 事件在事务提交之后发布，发布失败只记日志，不回滚也不报错。
pub(crate) async fn publish_after_commit(
    broadcaster: &Arc<dyn ChangeBroadcaster>,
    event: ChangeEvent,
) {
    if let Err(err) = broadcaster.publish(event).await {
        tracing::warn!(error = %err, "change event dropped");
    }
}
