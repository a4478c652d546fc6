use std::sync::Arc;

use domain::{ChangeEvent, DomainError, Login, NewRoom, RoomId};

use crate::{
    broadcaster::ChangeBroadcaster,
    clock::Clock,
    dto::RoomDto,
    error::ApplicationError,
    repository::{MembershipRepository, RoomRepository, UserRepository},
    services::publish_after_commit,
};

#[derive(Debug, Clone)]
pub struct CreateRoomRequest {
    pub name: String,
    pub creator: String,
    /// 被邀请人登录名。查不到的直接跳过，不算错误。
    pub invitees: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LeaveRoomRequest {
    pub room_id: i64,
    pub actor: String,
}

pub struct RoomServiceDependencies {
    pub room_repository: Arc<dyn RoomRepository>,
    pub membership_repository: Arc<dyn MembershipRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn ChangeBroadcaster>,
}

pub struct RoomService {
    deps: RoomServiceDependencies,
}

impl RoomService {
    pub fn new(deps: RoomServiceDependencies) -> Self {
        Self { deps }
    }

    /// 公共房间加上自己参与的私有房间，按 id 升序。
    pub async fn list_rooms(&self, actor: &str) -> Result<Vec<RoomDto>, ApplicationError> {
        let login = Login::parse(actor)?;
        let rooms = self.deps.room_repository.list_visible_to(&login).await?;
        Ok(rooms.iter().map(RoomDto::from).collect())
    }

    pub async fn create_room(
        &self,
        request: CreateRoomRequest,
    ) -> Result<RoomDto, ApplicationError> {
        let creator = Login::parse(request.creator)?;
        if self
            .deps
            .user_repository
            .find_by_login(&creator)
            .await?
            .is_none()
        {
            return Err(DomainError::UserNotFound.into());
        }

        let now = self.deps.clock.now();
        let room = NewRoom::private(request.name, creator.clone(), now)?;

        let mut members = vec![creator];
        for raw in request.invitees {
            let Ok(invitee) = Login::parse(raw) else {
                continue;
            };
            if members.contains(&invitee) {
                continue;
            }
            if self
                .deps
                .user_repository
                .find_by_login(&invitee)
                .await?
                .is_some()
            {
                members.push(invitee);
            }
        }

        let stored = self
            .deps
            .room_repository
            .create_with_members(room, members)
            .await?;

        tracing::info!(room_id = %stored.id, name = %stored.name, "room created");
        publish_after_commit(&self.deps.broadcaster, ChangeEvent::global_changed()).await;
        Ok(RoomDto::from(&stored))
    }

    pub async fn leave_room(&self, request: LeaveRoomRequest) -> Result<(), ApplicationError> {
        let login = Login::parse(request.actor)?;
        let room_id = RoomId::new(request.room_id);

        // 公共房间没有成员记录，退出请求直接当成功。
        if room_id == RoomId::PUBLIC {
            return Ok(());
        }

        if self
            .deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .is_none()
        {
            return Err(DomainError::RoomNotFound.into());
        }

        self.deps
            .membership_repository
            .remove(room_id, &login)
            .await?;

        publish_after_commit(&self.deps.broadcaster, ChangeEvent::global_changed()).await;
        Ok(())
    }
}
