//! 聊天社区系统核心领域模型
//!
//! 包含用户、聊天室、成员、消息、点赞等实体，以及权限判定和经验排名规则。

pub mod authority;
pub mod errors;
pub mod events;
pub mod membership;
pub mod message;
pub mod rank;
pub mod reaction;
pub mod role;
pub mod room;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use events::*;
pub use membership::*;
pub use message::*;
pub use rank::*;
pub use reaction::*;
pub use role::*;
pub use room::*;
pub use user::*;
pub use value_objects::*;
