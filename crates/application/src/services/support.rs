//! 服务测试共用的假件和装配函数。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use domain::{PasswordHash, Timestamp, FOUNDER_LOGIN, FOUNDER_PASSWORD};

use crate::clock::Clock;
use crate::dto::MessageDto;
use crate::local_broadcast::LocalChangeBroadcaster;
use crate::memory::MemoryStorage;
use crate::password::{PasswordHasher, PasswordHasherError};
use crate::services::{
    AuthenticateRequest, MessageService, MessageServiceDependencies, PostMessageRequest,
    RankingService, RankingServiceDependencies, RegisterRequest, RoomService,
    RoomServiceDependencies, UserService, UserServiceDependencies,
};

/// 可手动拨快的测试时钟。
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().expect("clock lock")
    }
}

pub fn test_epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid test epoch")
}

/// 明文对照的假哈希器，测试里不跑真正的 bcrypt。
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{plaintext}"))
            .map_err(|err| PasswordHasherError::hashing(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain:{plaintext}"))
    }
}

/// 全套服务装配在同一份内存存储和同一个时钟上。
pub struct TestHarness {
    pub storage: Arc<MemoryStorage>,
    pub clock: Arc<FixedClock>,
    pub broadcaster: Arc<LocalChangeBroadcaster>,
    pub users: UserService,
    pub rooms: RoomService,
    pub messages: MessageService,
    pub ranking: RankingService,
}

pub fn harness() -> TestHarness {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(FixedClock::new(test_epoch()));
    let broadcaster = Arc::new(LocalChangeBroadcaster::default());
    let hasher = Arc::new(PlainPasswordHasher);

    let users = UserService::new(UserServiceDependencies {
        user_repository: storage.clone(),
        password_hasher: hasher.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    });
    let rooms = RoomService::new(RoomServiceDependencies {
        room_repository: storage.clone(),
        membership_repository: storage.clone(),
        user_repository: storage.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    });
    let messages = MessageService::new(MessageServiceDependencies {
        user_repository: storage.clone(),
        room_repository: storage.clone(),
        membership_repository: storage.clone(),
        message_repository: storage.clone(),
        reaction_repository: storage.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    });
    let ranking = RankingService::new(RankingServiceDependencies {
        user_repository: storage.clone(),
        message_repository: storage.clone(),
        reaction_repository: storage.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    });

    TestHarness {
        storage,
        clock,
        broadcaster,
        users,
        rooms,
        messages,
        ranking,
    }
}

impl TestHarness {
    pub async fn register_user(&self, login: &str) {
        self.users
            .register(RegisterRequest {
                login: login.to_owned(),
                password: "secret".to_owned(),
                bio: String::new(),
            })
            .await
            .expect("register user");
    }

    /// 触发创始人自动建档并返回其登录名。
    pub async fn founder(&self) -> String {
        self.users
            .authenticate(AuthenticateRequest {
                login: FOUNDER_LOGIN.to_owned(),
                password: FOUNDER_PASSWORD.to_owned(),
            })
            .await
            .expect("founder bootstrap");
        FOUNDER_LOGIN.to_owned()
    }

    pub async fn post(&self, room_id: i64, author: &str, body: &str) -> MessageDto {
        self.messages
            .post_message(PostMessageRequest {
                room_id,
                author: author.to_owned(),
                body: body.to_owned(),
            })
            .await
            .expect("post message")
    }
}
