//! 领域层错误定义。
//!
//! 服务层和存储层都以这里的类型向上传递错误，展示层负责最终的用户文案。

use thiserror::Error;

use crate::value_objects::Timestamp;

/// 业务规则错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入不合法
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 登录名已被占用
    #[error("login already taken")]
    LoginAlreadyTaken,

    /// 用户不存在
    #[error("user not found")]
    UserNotFound,

    /// 聊天室不存在
    #[error("room not found")]
    RoomNotFound,

    /// 消息不存在
    #[error("message not found")]
    MessageNotFound,

    /// 不是私有聊天室成员
    #[error("user is not a member of the room")]
    UserNotInRoom,

    /// 角色或归属不满足要求
    #[error("insufficient permissions")]
    InsufficientPermissions,

    /// 对象不允许该操作，例如对 Creator 禁言
    #[error("operation not allowed")]
    OperationNotAllowed,

    /// 发言被禁言拦截
    #[error("user is muted until {until}")]
    UserMuted { until: Timestamp },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 持久化错误。业务含义（去重冲突、不存在）与底层故障分开表达。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
