//! 内存存储，实现全部仓储接口。
//!
//! 一把互斥锁覆盖全部状态，锁内的多步写入就是事务，
//! 翻转点赞、级联删除这类组合操作因此天然原子。
//! 服务层单元测试和接口集成测试共用这套存储。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    Login, Membership, Message, MessageBody, MessageId, NewMessage, NewRoom, Reaction,
    RepositoryError, Room, RoomId, RoomKind, User, PUBLIC_ROOM_CREATOR, PUBLIC_ROOM_NAME,
};
use tokio::sync::Mutex;

use crate::repository::{
    MembershipRepository, MessageRepository, ReactionRepository, RoomRepository, UserRepository,
};

#[derive(Debug)]
struct MemoryState {
    users: Vec<User>,
    rooms: Vec<Room>,
    memberships: Vec<Membership>,
    messages: Vec<Message>,
    reactions: Vec<Reaction>,
    next_room_id: i64,
    next_message_id: i64,
}

#[derive(Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// 与迁移脚本一致，带着预置的公共聊天室启动。
    pub fn new() -> Self {
        let public_room = Room {
            id: RoomId::PUBLIC,
            name: PUBLIC_ROOM_NAME.to_owned(),
            creator: Login::parse(PUBLIC_ROOM_CREATOR).expect("seed creator login is valid"),
            kind: RoomKind::Public,
            created_at: Utc::now(),
        };
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                users: Vec::new(),
                rooms: vec![public_room],
                memberships: Vec::new(),
                messages: Vec::new(),
                reactions: Vec::new(),
                next_room_id: RoomId::PUBLIC.0 + 1,
                next_message_id: 1,
            })),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryStorage {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.login == user.login) {
            return Err(RepositoryError::Conflict);
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        match state.users.iter_mut().find(|u| u.login == user.login) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_login(&self, login: &Login) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.login == *login).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        // Vec 的插入顺序就是注册顺序。
        Ok(state.users.clone())
    }
}

#[async_trait]
impl RoomRepository for MemoryStorage {
    async fn create_with_members(
        &self,
        room: NewRoom,
        members: Vec<Login>,
    ) -> Result<Room, RepositoryError> {
        let mut state = self.state.lock().await;
        let id = RoomId::new(state.next_room_id);
        state.next_room_id += 1;

        let stored = Room {
            id,
            name: room.name,
            creator: room.creator,
            kind: room.kind,
            created_at: room.created_at,
        };
        state.rooms.push(stored.clone());
        for login in members {
            if !state
                .memberships
                .iter()
                .any(|m| m.room_id == id && m.login == login)
            {
                state
                    .memberships
                    .push(Membership::new(id, login, stored.created_at));
            }
        }
        Ok(stored)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list_visible_to(&self, login: &Login) -> Result<Vec<Room>, RepositoryError> {
        let state = self.state.lock().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .iter()
            .filter(|room| {
                room.id == RoomId::PUBLIC
                    || state
                        .memberships
                        .iter()
                        .any(|m| m.room_id == room.id && m.login == *login)
            })
            .cloned()
            .collect();
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }
}

#[async_trait]
impl MembershipRepository for MemoryStorage {
    async fn add(&self, membership: Membership) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let exists = state
            .memberships
            .iter()
            .any(|m| m.room_id == membership.room_id && m.login == membership.login);
        if !exists {
            state.memberships.push(membership);
        }
        Ok(())
    }

    async fn remove(&self, room_id: RoomId, login: &Login) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state
            .memberships
            .retain(|m| !(m.room_id == room_id && m.login == *login));
        Ok(())
    }

    async fn find(
        &self,
        room_id: RoomId,
        login: &Login,
    ) -> Result<Option<Membership>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.room_id == room_id && m.login == *login)
            .cloned())
    }
}

#[async_trait]
impl MessageRepository for MemoryStorage {
    async fn create(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = insert_message(&mut state, message);
        Ok(stored)
    }

    async fn create_many(&self, messages: Vec<NewMessage>) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        for message in messages {
            insert_message(&mut state, message);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn update_body(
        &self,
        id: MessageId,
        body: &MessageBody,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        match state.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.edit(body.clone());
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_with_reactions(&self, id: MessageId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() == before {
            return Err(RepositoryError::NotFound);
        }
        state.reactions.retain(|r| r.message_id != id);
        Ok(())
    }

    async fn list_by_room(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        // 插入顺序即 id 升序。
        Ok(state
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn count_by_author(&self, author: &Login) -> Result<u64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().filter(|m| m.author == *author).count() as u64)
    }
}

fn insert_message(state: &mut MemoryState, message: NewMessage) -> Message {
    let id = MessageId::new(state.next_message_id);
    state.next_message_id += 1;
    let stored = Message {
        id,
        room_id: message.room_id,
        author: message.author,
        author_role: message.author_role,
        body: message.body,
        sent_at: message.sent_at,
    };
    state.messages.push(stored.clone());
    stored
}

#[async_trait]
impl ReactionRepository for MemoryStorage {
    async fn toggle(
        &self,
        message_id: MessageId,
        login: &Login,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.messages.iter().any(|m| m.id == message_id) {
            return Err(RepositoryError::NotFound);
        }
        let position = state
            .reactions
            .iter()
            .position(|r| r.message_id == message_id && r.login == *login);
        match position {
            Some(index) => {
                state.reactions.remove(index);
                Ok(false)
            }
            None => {
                state
                    .reactions
                    .push(Reaction::new(message_id, login.clone()));
                Ok(true)
            }
        }
    }

    async fn exists(
        &self,
        message_id: MessageId,
        login: &Login,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .reactions
            .iter()
            .any(|r| r.message_id == message_id && r.login == *login))
    }

    async fn count_for_message(&self, message_id: MessageId) -> Result<u64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .reactions
            .iter()
            .filter(|r| r.message_id == message_id)
            .count() as u64)
    }

    async fn count_received_by(&self, author: &Login) -> Result<u64, RepositoryError> {
        let state = self.state.lock().await;
        let authored: HashSet<MessageId> = state
            .messages
            .iter()
            .filter(|m| m.author == *author)
            .map(|m| m.id)
            .collect();
        Ok(state
            .reactions
            .iter()
            .filter(|r| authored.contains(&r.message_id))
            .count() as u64)
    }
}
