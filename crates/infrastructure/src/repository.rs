//! PostgreSQL 仓储实现。
//!
//! 行结构体经 TryFrom 转回领域类型，角色和房间类型以文本列存储。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Login, Membership, Message, MessageBody, MessageId, NewMessage, NewRoom, PasswordHash,
    RepositoryError, Role, Room, RoomId, RoomKind, User,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use application::repository::{
    MembershipRepository, MessageRepository, ReactionRepository, RoomRepository, UserRepository,
};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict;
        }
        // 外键落空意味着被引用的行已经没了。
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::storage(other.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    login: String,
    password_hash: String,
    bio: String,
    role: String,
    mute_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let login = Login::parse(value.login).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;
        let role = Role::parse(&value.role).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            login,
            password,
            bio: value.bio,
            role,
            mute_until: value.mute_until,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: i64,
    name: String,
    creator: String,
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoomRecord> for Room {
    type Error = RepositoryError;

    fn try_from(value: RoomRecord) -> Result<Self, Self::Error> {
        let creator = Login::parse(value.creator).map_err(|err| invalid_data(err.to_string()))?;
        let kind = RoomKind::parse(&value.kind).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Room {
            id: RoomId::new(value.id),
            name: value.name,
            creator,
            kind,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MembershipRecord {
    room_id: i64,
    login: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRecord> for Membership {
    type Error = RepositoryError;

    fn try_from(value: MembershipRecord) -> Result<Self, Self::Error> {
        let login = Login::parse(value.login).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Membership::new(
            RoomId::new(value.room_id),
            login,
            value.joined_at,
        ))
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: i64,
    room_id: i64,
    author: String,
    author_role: String,
    body: String,
    sent_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let author = Login::parse(value.author).map_err(|err| invalid_data(err.to_string()))?;
        let author_role =
            Role::parse(&value.author_role).map_err(|err| invalid_data(err.to_string()))?;
        let body = MessageBody::parse(value.body).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message {
            id: MessageId::new(value.id),
            room_id: RoomId::new(value.room_id),
            author,
            author_role,
            body,
            sent_at: value.sent_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (login, password_hash, bio, role, mute_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING login, password_hash, bio, role, mute_until, created_at
            "#,
        )
        .bind(user.login.as_str())
        .bind(user.password.as_str())
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.mute_until)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET password_hash = $2, bio = $3, role = $4, mute_until = $5
            WHERE login = $1
            RETURNING login, password_hash, bio, role, mute_until, created_at
            "#,
        )
        .bind(user.login.as_str())
        .bind(user.password.as_str())
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(user.mute_until)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT login, password_hash, bio, role, mute_until, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        // seq 是注册先后的序列列，时间戳可能并列。
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT login, password_hash, bio, role, mute_until, created_at
            FROM users
            ORDER BY seq
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn create_with_members(
        &self,
        room: NewRoom,
        members: Vec<Login>,
    ) -> Result<Room, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            INSERT INTO rooms (name, creator, kind, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, creator, kind, created_at
            "#,
        )
        .bind(&room.name)
        .bind(room.creator.as_str())
        .bind(room.kind.as_str())
        .bind(room.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        for member in &members {
            sqlx::query(
                r#"
                INSERT INTO memberships (room_id, login, joined_at)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(record.id)
            .bind(member.as_str())
            .bind(room.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Room::try_from(record)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            SELECT id, name, creator, kind, created_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }

    async fn list_visible_to(&self, login: &Login) -> Result<Vec<Room>, RepositoryError> {
        let records = sqlx::query_as::<_, RoomRecord>(
            r#"
            SELECT id, name, creator, kind, created_at
            FROM rooms
            WHERE kind = 'public'
               OR id IN (SELECT room_id FROM memberships WHERE login = $1)
            ORDER BY id
            "#,
        )
        .bind(login.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Room::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    async fn add(&self, membership: Membership) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (room_id, login, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(membership.room_id.0)
        .bind(membership.login.as_str())
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove(&self, room_id: RoomId, login: &Login) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM memberships WHERE room_id = $1 AND login = $2")
            .bind(room_id.0)
            .bind(login.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find(
        &self,
        room_id: RoomId,
        login: &Login,
    ) -> Result<Option<Membership>, RepositoryError> {
        let record = sqlx::query_as::<_, MembershipRecord>(
            r#"
            SELECT room_id, login, joined_at
            FROM memberships
            WHERE room_id = $1 AND login = $2
            "#,
        )
        .bind(room_id.0)
        .bind(login.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Membership::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (room_id, author, author_role, body, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, room_id, author, author_role, body, sent_at
            "#,
        )
        .bind(message.room_id.0)
        .bind(message.author.as_str())
        .bind(message.author_role.as_str())
        .bind(message.body.as_str())
        .bind(message.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn create_many(&self, messages: Vec<NewMessage>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for message in &messages {
            sqlx::query(
                r#"
                INSERT INTO messages (room_id, author, author_role, body, sent_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(message.room_id.0)
            .bind(message.author.as_str())
            .bind(message.author_role.as_str())
            .bind(message.body.as_str())
            .bind(message.sent_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, author, author_role, body, sent_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn update_body(&self, id: MessageId, body: &MessageBody) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE messages SET body = $2 WHERE id = $1")
            .bind(id.0)
            .bind(body.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_with_reactions(&self, id: MessageId) -> Result<(), RepositoryError> {
        // reactions 的外键带 ON DELETE CASCADE，点赞随消息同事务清除。
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, author, author_role, body, sent_at
            FROM messages
            WHERE room_id = $1
            ORDER BY id
            "#,
        )
        .bind(room_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn count_by_author(&self, author: &Login) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE author = $1")
            .bind(author.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }
}

#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    async fn toggle(
        &self,
        message_id: MessageId,
        login: &Login,
    ) -> Result<bool, RepositoryError> {
        // (message_id, login) 上的主键让插入和删除各自原子。
        // 两边都落空说明恰好撞上并发翻转，重试到落在其中一边为止。
        loop {
            let inserted = sqlx::query(
                r#"
                INSERT INTO reactions (message_id, login)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(message_id.0)
            .bind(login.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
            if inserted.rows_affected() > 0 {
                return Ok(true);
            }

            let removed =
                sqlx::query("DELETE FROM reactions WHERE message_id = $1 AND login = $2")
                    .bind(message_id.0)
                    .bind(login.as_str())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_err)?;
            if removed.rows_affected() > 0 {
                return Ok(false);
            }
        }
    }

    async fn exists(
        &self,
        message_id: MessageId,
        login: &Login,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reactions WHERE message_id = $1 AND login = $2)",
        )
        .bind(message_id.0)
        .bind(login.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(exists)
    }

    async fn count_for_message(&self, message_id: MessageId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reactions WHERE message_id = $1")
                .bind(message_id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }

    async fn count_received_by(&self, author: &Login) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM reactions r
            JOIN messages m ON m.id = r.message_id
            WHERE m.author = $1
            "#,
        )
        .bind(author.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(count as u64)
    }
}

/// 所有仓储共享同一个连接池的聚合结构，方便主程序装配。
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub room_repository: Arc<PgRoomRepository>,
    pub membership_repository: Arc<PgMembershipRepository>,
    pub message_repository: Arc<PgMessageRepository>,
    pub reaction_repository: Arc<PgReactionRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            room_repository: Arc::new(PgRoomRepository::new(pool.clone())),
            membership_repository: Arc::new(PgMembershipRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            reaction_repository: Arc::new(PgReactionRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
