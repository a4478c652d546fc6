//! 主应用程序入口
//!
//! 装配配置、数据库与各层服务，启动 Axum Web API。

use std::sync::Arc;

use application::{
    Clock, MessageService, MessageServiceDependencies, RankingService,
    RankingServiceDependencies, RoomService, RoomServiceDependencies, SystemClock, UserService,
    UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();
    config.validate()?;

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let infra = Infrastructure::connect(InfrastructureConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        bcrypt_cost: config.server.bcrypt_cost,
        broadcast_capacity: config.broadcast.capacity,
    })
    .await?;

    let storage = infra.storage.clone();
    let password_hasher = infra.password_hasher_trait();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::default());
    let broadcaster = infra.broadcaster.clone();

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: storage.user_repository.clone(),
        password_hasher,
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let room_service = Arc::new(RoomService::new(RoomServiceDependencies {
        room_repository: storage.room_repository.clone(),
        membership_repository: storage.membership_repository.clone(),
        user_repository: storage.user_repository.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        user_repository: storage.user_repository.clone(),
        room_repository: storage.room_repository.clone(),
        membership_repository: storage.membership_repository.clone(),
        message_repository: storage.message_repository.clone(),
        reaction_repository: storage.reaction_repository.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let ranking_service = Arc::new(RankingService::new(RankingServiceDependencies {
        user_repository: storage.user_repository.clone(),
        message_repository: storage.message_repository.clone(),
        reaction_repository: storage.reaction_repository.clone(),
        clock,
        broadcaster: broadcaster.clone(),
    }));

    let state = AppState::new(
        user_service,
        room_service,
        message_service,
        ranking_service,
        broadcaster,
    );

    let app = router(state);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("聊天室服务器启动在 http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
