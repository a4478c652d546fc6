use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{Login, RoomId, Timestamp};

/// 预置公共聊天室的名称。
pub const PUBLIC_ROOM_NAME: &str = "general";

/// 预置公共聊天室的创建者标识，不对应真实用户。
pub const PUBLIC_ROOM_CREATOR: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Public,
    Private,
}

impl RoomKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomKind::Public => "public",
            RoomKind::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "public" => Ok(RoomKind::Public),
            "private" => Ok(RoomKind::Private),
            _ => Err(DomainError::invalid_argument("kind", "unknown room kind")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub creator: Login,
    pub kind: RoomKind,
    pub created_at: Timestamp,
}

impl Room {
    pub fn is_public(&self) -> bool {
        self.kind == RoomKind::Public
    }
}

/// 待插入的聊天室。id 由存储层分配，因此创建走草稿结构。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub name: String,
    pub creator: Login,
    pub kind: RoomKind,
    pub created_at: Timestamp,
}

impl NewRoom {
    pub fn private(
        name: impl Into<String>,
        creator: Login,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = validate_name(name.into())?;
        Ok(Self {
            name,
            creator,
            kind: RoomKind::Private,
            created_at: now,
        })
    }
}

fn validate_name(name: String) -> Result<String, DomainError> {
    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(DomainError::invalid_argument("name", "cannot be empty"));
    }
    if name.len() > 100 {
        return Err(DomainError::invalid_argument("name", "too long"));
    }
    Ok(name)
}
