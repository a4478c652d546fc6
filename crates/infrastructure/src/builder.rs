use std::sync::Arc;

use application::{LocalChangeBroadcaster, PasswordHasher};
use domain::RoomId;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
};

/// 基础设施装配参数，值由 config 层提供。
#[derive(Debug, Clone)]
pub struct InfrastructureConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bcrypt_cost: Option<u32>,
    pub broadcast_capacity: usize,
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("public room seed is missing after migrations")]
    MissingPublicRoom,
}

/// 连上数据库并把各适配器装配到位的基础设施集合。
#[derive(Clone)]
pub struct Infrastructure {
    pub storage: Arc<PgStorage>,
    pub password_hasher: Arc<BcryptPasswordHasher>,
    pub broadcaster: Arc<LocalChangeBroadcaster>,
}

impl Infrastructure {
    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database_url, config.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!("database migrations applied");

        // 后续逻辑都假定公共房间在场。
        let seeded: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE id = $1)")
            .bind(RoomId::PUBLIC.0)
            .fetch_one(&pool)
            .await?;
        if !seeded {
            return Err(InfrastructureError::MissingPublicRoom);
        }

        Ok(Self {
            storage: Arc::new(PgStorage::new(pool)),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
            broadcaster: Arc::new(LocalChangeBroadcaster::new(config.broadcast_capacity)),
        })
    }

    pub fn password_hasher_trait(&self) -> Arc<dyn PasswordHasher> {
        self.password_hasher.clone()
    }
}
