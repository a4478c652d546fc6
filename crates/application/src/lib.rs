//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、变更广播）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod error;
pub mod local_broadcast;
pub mod memory;
pub mod password;
pub mod repository;
pub mod services;

pub use broadcaster::{BroadcastError, ChangeBroadcaster};
pub use clock::{Clock, SystemClock};
pub use dto::{
    LeaderboardEntryDto, MessageDto, ProfileDto, RoomDto, SessionDto, UserDto,
};
pub use error::ApplicationError;
pub use local_broadcast::{EventStream, LocalChangeBroadcaster};
pub use memory::MemoryStorage;
pub use password::{PasswordHasher, PasswordHasherError};
pub use repository::{
    MembershipRepository, MessageRepository, ReactionRepository, RoomRepository, UserRepository,
};
pub use services::{
    AuthenticateRequest, CreateRoomRequest, DeleteMessageRequest, EditMessageRequest,
    GrantBonusRequest, LeaveRoomRequest, MessageService, MessageServiceDependencies,
    PostMessageRequest, RankingService, RankingServiceDependencies, RegisterRequest, RoomService,
    RoomServiceDependencies, SetMuteRequest, SetRoleRequest, ToggleReactionRequest,
    UpdateBioRequest, UserService, UserServiceDependencies,
};
