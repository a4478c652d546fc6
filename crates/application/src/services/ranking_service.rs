use std::sync::Arc;

use domain::{
    ChangeEvent, DomainError, Login, NewMessage, UserStats, BONUS_GRANT_MESSAGES, FOUNDER_LOGIN,
};

use crate::{
    broadcaster::ChangeBroadcaster,
    clock::Clock,
    dto::{LeaderboardEntryDto, ProfileDto},
    error::ApplicationError,
    repository::{MessageRepository, ReactionRepository, UserRepository},
    services::publish_after_commit,
};

#[derive(Debug, Clone)]
pub struct GrantBonusRequest {
    pub granted_by: String,
    pub target: String,
}

pub struct RankingServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub reaction_repository: Arc<dyn ReactionRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn ChangeBroadcaster>,
}

pub struct RankingService {
    deps: RankingServiceDependencies,
}

impl RankingService {
    pub fn new(deps: RankingServiceDependencies) -> Self {
        Self { deps }
    }

    /// 经验值永远现算，没有任何缓存或落库的计数。
    pub async fn compute_stats(&self, login: &Login) -> Result<UserStats, ApplicationError> {
        let messages = self.deps.message_repository.count_by_author(login).await?;
        let reactions = self
            .deps
            .reaction_repository
            .count_received_by(login)
            .await?;
        Ok(UserStats::from_counts(login, messages, reactions))
    }

    pub async fn profile(&self, login: &str) -> Result<ProfileDto, ApplicationError> {
        let login = Login::parse(login)?;
        let user = self
            .deps
            .user_repository
            .find_by_login(&login)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        let stats = self.compute_stats(&login).await?;
        Ok(ProfileDto::new(&user, stats))
    }

    /// 全员经验快照，按经验值降序。并列名次保持注册顺序（稳定排序）。
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntryDto>, ApplicationError> {
        let users = self.deps.user_repository.list_all().await?;
        let mut entries = Vec::with_capacity(users.len());
        for user in &users {
            let stats = self.compute_stats(&user.login).await?;
            entries.push(LeaderboardEntryDto {
                login: user.login.as_str().to_owned(),
                xp: stats.xp,
            });
        }
        entries.sort_by(|a, b| b.xp.cmp(&a.xp));
        Ok(entries)
    }

    /// 奖励以固定条数的标记消息落库，经验公式照常折算，没有独立的加分台账。
    pub async fn grant_bonus(&self, request: GrantBonusRequest) -> Result<(), ApplicationError> {
        let granted_by = Login::parse(request.granted_by)?;
        if granted_by.as_str() != FOUNDER_LOGIN {
            return Err(DomainError::InsufficientPermissions.into());
        }

        let target = Login::parse(request.target)?;
        let target_user = self
            .deps
            .user_repository
            .find_by_login(&target)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let now = self.deps.clock.now();
        let messages = (0..BONUS_GRANT_MESSAGES)
            .map(|_| NewMessage::bonus(target.clone(), target_user.role, now))
            .collect();
        self.deps.message_repository.create_many(messages).await?;

        tracing::info!(target = %target, "bonus granted");
        publish_after_commit(&self.deps.broadcaster, ChangeEvent::global_changed()).await;
        Ok(())
    }
}
