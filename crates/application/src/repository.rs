use async_trait::async_trait;
use domain::{
    Login, Membership, Message, MessageBody, MessageId, NewMessage, NewRoom, RepositoryError,
    Room, RoomId, User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, RepositoryError>;
    /// 全量用户，按注册先后排序。排行榜的并列名次靠这个顺序保持稳定。
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 建房和成员记录一次事务写入，id 由存储层分配。
    async fn create_with_members(
        &self,
        room: NewRoom,
        members: Vec<Login>,
    ) -> Result<Room, RepositoryError>;
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError>;
    /// 公共房间加上 login 参与的私有房间，按 id 升序。
    async fn list_visible_to(&self, login: &Login) -> Result<Vec<Room>, RepositoryError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// 重复加入是幂等的。
    async fn add(&self, membership: Membership) -> Result<(), RepositoryError>;
    /// 不存在的成员记录直接当成功，退出是幂等的。
    async fn remove(&self, room_id: RoomId, login: &Login) -> Result<(), RepositoryError>;
    async fn find(
        &self,
        room_id: RoomId,
        login: &Login,
    ) -> Result<Option<Membership>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError>;
    /// 多条消息一次事务写入，奖励发放用。
    async fn create_many(&self, messages: Vec<NewMessage>) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;
    /// 只改正文，发送时间不动。
    async fn update_body(
        &self,
        id: MessageId,
        body: &MessageBody,
    ) -> Result<(), RepositoryError>;
    /// 消息和它的点赞在同一个事务里删除。
    async fn delete_with_reactions(&self, id: MessageId) -> Result<(), RepositoryError>;
    /// 房间内全部消息，按 id 升序。
    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError>;
    async fn count_by_author(&self, author: &Login) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// 原子翻转：有则删、无则插，返回翻转后的状态。
    /// 同一 (消息, 用户) 的并发翻转必须串行化，不允许检查后写入的竞态。
    async fn toggle(&self, message_id: MessageId, login: &Login)
        -> Result<bool, RepositoryError>;
    async fn exists(&self, message_id: MessageId, login: &Login)
        -> Result<bool, RepositoryError>;
    async fn count_for_message(&self, message_id: MessageId) -> Result<u64, RepositoryError>;
    /// login 名下所有消息收到的点赞总数。
    async fn count_received_by(&self, author: &Login) -> Result<u64, RepositoryError>;
}
