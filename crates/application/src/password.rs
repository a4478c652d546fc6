//! 密码哈希端口。具体算法由基础设施层提供，测试里用明文对照的假件。

use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password verification failed: {0}")]
    Verification(String),
}

impl PasswordHasherError {
    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing(message.into())
    }

    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification(message.into())
    }
}

/// 慢哈希端口。实现方负责把计算挪出异步工作线程。
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;
}
