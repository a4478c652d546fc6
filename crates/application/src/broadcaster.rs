//! 变更通知的发布端口，本地实现见 local_broadcast。

use async_trait::async_trait;
use domain::ChangeEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("publish failed: {0}")]
    Failed(String),
}

/// 事务提交之后才允许调用。失败由调用方记日志吞掉，不回滚业务操作。
#[async_trait]
pub trait ChangeBroadcaster: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> Result<(), BroadcastError>;
}
