//! 基础设施层实现。
//!
//! 提供数据库仓储、密码哈希、数据库迁移等适配器，实现应用层定义的接口。

pub mod builder;
pub mod migrations;
pub mod password;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgMembershipRepository, PgMessageRepository, PgReactionRepository,
    PgRoomRepository, PgStorage, PgUserRepository,
};
