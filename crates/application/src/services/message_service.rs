use std::sync::Arc;

use domain::{
    authority, ChangeEvent, DomainError, Login, Message, MessageBody, MessageId, NewMessage,
    RepositoryError, Room, RoomId, User,
};

use crate::{
    broadcaster::ChangeBroadcaster,
    clock::Clock,
    dto::MessageDto,
    error::ApplicationError,
    repository::{
        MembershipRepository, MessageRepository, ReactionRepository, RoomRepository,
        UserRepository,
    },
    services::publish_after_commit,
};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub room_id: i64,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub message_id: i64,
    pub editor: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct DeleteMessageRequest {
    pub message_id: i64,
    pub deleted_by: String,
}

#[derive(Debug, Clone)]
pub struct ToggleReactionRequest {
    pub message_id: i64,
    pub actor: String,
}

pub struct MessageServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub room_repository: Arc<dyn RoomRepository>,
    pub membership_repository: Arc<dyn MembershipRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub reaction_repository: Arc<dyn ReactionRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn ChangeBroadcaster>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    async fn require_user(&self, login: &Login) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_login(login)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    async fn require_room(&self, room_id: RoomId) -> Result<Room, ApplicationError> {
        self.deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| DomainError::RoomNotFound.into())
    }

    async fn require_message(&self, id: MessageId) -> Result<Message, ApplicationError> {
        self.deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::MessageNotFound.into())
    }

    /// 私有房间要求成员记录，公共房间对所有人开放。
    async fn ensure_can_access(&self, room: &Room, login: &Login) -> Result<(), ApplicationError> {
        if room.is_public() {
            return Ok(());
        }
        self.deps
            .membership_repository
            .find(room.id, login)
            .await?
            .ok_or(DomainError::UserNotInRoom)?;
        Ok(())
    }

    pub async fn post_message(
        &self,
        request: PostMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        let author = Login::parse(request.author)?;
        let actor = self.require_user(&author).await?;

        let now = self.deps.clock.now();
        if authority::posting_blocked_by_mute(&actor, now) {
            let until = actor.mute_until.unwrap_or(now);
            return Err(DomainError::UserMuted { until }.into());
        }

        let body = MessageBody::parse(request.body)?;
        let room = self.require_room(RoomId::new(request.room_id)).await?;
        self.ensure_can_access(&room, &author).await?;

        // 角色快照取发帖时刻的当前值，之后的角色变更不回写已发消息。
        let message = self
            .deps
            .message_repository
            .create(NewMessage::new(room.id, author, actor.role, body, now))
            .await?;

        publish_after_commit(
            &self.deps.broadcaster,
            ChangeEvent::room_changed(message.room_id),
        )
        .await;
        Ok(MessageDto::new(&message, 0, false))
    }

    pub async fn edit_message(&self, request: EditMessageRequest) -> Result<(), ApplicationError> {
        let editor = Login::parse(request.editor)?;
        let message = self
            .require_message(MessageId::new(request.message_id))
            .await?;

        if !authority::is_owner(&message, &editor) {
            return Err(DomainError::InsufficientPermissions.into());
        }

        let body = MessageBody::parse(request.body)?;
        self.deps
            .message_repository
            .update_body(message.id, &body)
            .await
            .map_err(map_missing_message)?;

        publish_after_commit(
            &self.deps.broadcaster,
            ChangeEvent::room_changed(message.room_id),
        )
        .await;
        Ok(())
    }

    pub async fn delete_message(
        &self,
        request: DeleteMessageRequest,
    ) -> Result<(), ApplicationError> {
        let deleted_by = Login::parse(request.deleted_by)?;
        let message = self
            .require_message(MessageId::new(request.message_id))
            .await?;

        // 权限基于刚读出的用户记录判定，角色可能刚刚变过。
        let actor = self.deps.user_repository.find_by_login(&deleted_by).await?;
        if !authority::can_manage(&message, actor.as_ref()) {
            return Err(DomainError::InsufficientPermissions.into());
        }

        self.deps
            .message_repository
            .delete_with_reactions(message.id)
            .await
            .map_err(map_missing_message)?;

        tracing::info!(message_id = %message.id, deleted_by = %deleted_by, "message deleted");
        publish_after_commit(
            &self.deps.broadcaster,
            ChangeEvent::room_changed(message.room_id),
        )
        .await;
        Ok(())
    }

    pub async fn toggle_reaction(
        &self,
        request: ToggleReactionRequest,
    ) -> Result<bool, ApplicationError> {
        let actor = Login::parse(request.actor)?;
        self.require_user(&actor).await?;
        let message = self
            .require_message(MessageId::new(request.message_id))
            .await?;

        let liked = self
            .deps
            .reaction_repository
            .toggle(message.id, &actor)
            .await
            .map_err(map_missing_message)?;

        publish_after_commit(
            &self.deps.broadcaster,
            ChangeEvent::room_changed(message.room_id),
        )
        .await;
        Ok(liked)
    }

    /// 房间消息列表，带奖励标记的消息不出现在这里。
    pub async fn list_messages(
        &self,
        room_id: i64,
        actor: &str,
    ) -> Result<Vec<MessageDto>, ApplicationError> {
        let login = Login::parse(actor)?;
        let room = self.require_room(RoomId::new(room_id)).await?;
        self.ensure_can_access(&room, &login).await?;

        let messages = self.deps.message_repository.list_by_room(room.id).await?;
        let mut dtos = Vec::with_capacity(messages.len());
        for message in messages.iter().filter(|m| !m.is_bonus()) {
            let like_count = self
                .deps
                .reaction_repository
                .count_for_message(message.id)
                .await?;
            let liked_by_me = self
                .deps
                .reaction_repository
                .exists(message.id, &login)
                .await?;
            dtos.push(MessageDto::new(message, like_count, liked_by_me));
        }
        Ok(dtos)
    }
}

/// 校验和写入之间消息可能被并发删除，把存储层的未命中折回领域错误。
fn map_missing_message(err: RepositoryError) -> ApplicationError {
    match err {
        RepositoryError::NotFound => DomainError::MessageNotFound.into(),
        other => ApplicationError::from(other),
    }
}
