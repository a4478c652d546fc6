use std::sync::Arc;

use chrono::Duration;
use domain::{DomainError, Login, Role, User, FOUNDER_LOGIN, FOUNDER_PASSWORD};

use crate::{
    broadcaster::ChangeBroadcaster, clock::Clock, dto::{SessionDto, UserDto},
    error::ApplicationError, password::PasswordHasher, repository::UserRepository,
    services::publish_after_commit,
};
use domain::{ChangeEvent, RepositoryError};

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub bio: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UpdateBioRequest {
    pub login: String,
    pub bio: String,
}

#[derive(Debug, Clone)]
pub struct SetRoleRequest {
    pub acted_by: String,
    pub target: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct SetMuteRequest {
    pub acted_by: String,
    pub target: String,
    /// Some 表示从现在起禁言这么多分钟，None 表示解除。
    pub duration_minutes: Option<i64>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn ChangeBroadcaster>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserDto, ApplicationError> {
        let login = Login::parse(request.login)?;
        if request.password.trim().is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }

        if self
            .deps
            .user_repository
            .find_by_login(&login)
            .await?
            .is_some()
        {
            return Err(DomainError::LoginAlreadyTaken.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let now = self.deps.clock.now();
        let user = User::register(login, password_hash, request.bio, now);

        // 唯一键兜底：查重和插入之间仍可能撞上并发注册。
        let stored = self
            .deps
            .user_repository
            .create(user)
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => DomainError::LoginAlreadyTaken.into(),
                other => ApplicationError::from(other),
            })?;

        tracing::info!(login = %stored.login, "user registered");
        Ok(UserDto::from(&stored))
    }

    pub async fn authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> Result<SessionDto, ApplicationError> {
        let login = Login::parse(request.login)?;

        let user = match self.deps.user_repository.find_by_login(&login).await? {
            Some(user) => user,
            None => {
                // 创始人首次登录时用预置口令自动建档，其余未知账号一律拒绝。
                if login.as_str() == FOUNDER_LOGIN && request.password == FOUNDER_PASSWORD {
                    return self.provision_founder(login, &request.password).await;
                }
                return Err(ApplicationError::Authentication);
            }
        };

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(SessionDto::from(&user))
    }

    async fn provision_founder(
        &self,
        login: Login,
        password: &str,
    ) -> Result<SessionDto, ApplicationError> {
        let password_hash = self.deps.password_hasher.hash(password).await?;
        let now = self.deps.clock.now();
        let founder = User::founder(login, password_hash, now);

        let stored = self
            .deps
            .user_repository
            .create(founder)
            .await
            .map_err(|err| match err {
                // 并发登录已经建好了档，直接当认证通过处理不安全，让调用方重试。
                RepositoryError::Conflict => ApplicationError::Authentication,
                other => ApplicationError::from(other),
            })?;

        tracing::info!(login = %stored.login, "founder account provisioned");
        Ok(SessionDto::from(&stored))
    }

    pub async fn update_bio(&self, request: UpdateBioRequest) -> Result<UserDto, ApplicationError> {
        let login = Login::parse(request.login)?;
        let mut user = self
            .deps
            .user_repository
            .find_by_login(&login)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        user.update_bio(request.bio);
        let stored = self.deps.user_repository.update(user).await?;
        Ok(UserDto::from(&stored))
    }

    pub async fn set_role(&self, request: SetRoleRequest) -> Result<(), ApplicationError> {
        let acted_by = Login::parse(request.acted_by)?;
        let target = Login::parse(request.target)?;

        let actor = self
            .deps
            .user_repository
            .find_by_login(&acted_by)
            .await?
            .ok_or(DomainError::InsufficientPermissions)?;
        if actor.role != Role::Creator {
            return Err(DomainError::InsufficientPermissions.into());
        }
        if request.role == Role::Creator {
            return Err(DomainError::OperationNotAllowed.into());
        }

        let mut target_user = self
            .deps
            .user_repository
            .find_by_login(&target)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        // Creator 自身的角色不可被改动。
        if target_user.role == Role::Creator {
            return Err(DomainError::OperationNotAllowed.into());
        }

        target_user.change_role(request.role);
        self.deps.user_repository.update(target_user).await?;

        tracing::info!(target = %target, role = %request.role, "role changed");
        publish_after_commit(&self.deps.broadcaster, ChangeEvent::global_changed()).await;
        Ok(())
    }

    pub async fn set_mute(&self, request: SetMuteRequest) -> Result<(), ApplicationError> {
        let acted_by = Login::parse(request.acted_by)?;
        let target = Login::parse(request.target)?;

        let actor = self
            .deps
            .user_repository
            .find_by_login(&acted_by)
            .await?
            .ok_or(DomainError::InsufficientPermissions)?;
        if !actor.role.has_moderator_access() {
            return Err(DomainError::InsufficientPermissions.into());
        }

        let mut target_user = self
            .deps
            .user_repository
            .find_by_login(&target)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if target_user.role == Role::Creator {
            return Err(DomainError::OperationNotAllowed.into());
        }

        let until = match request.duration_minutes {
            Some(minutes) => {
                if minutes <= 0 {
                    return Err(
                        DomainError::invalid_argument("duration", "must be positive").into()
                    );
                }
                Some(self.deps.clock.now() + Duration::minutes(minutes))
            }
            None => None,
        };

        target_user.set_mute(until);
        self.deps.user_repository.update(target_user).await?;

        tracing::info!(target = %target, muted = until.is_some(), "mute changed");
        publish_after_commit(&self.deps.broadcaster, ChangeEvent::global_changed()).await;
        Ok(())
    }
}
