//! 接口测试共用的装配和请求辅助函数。

use std::sync::Arc;

use application::{
    LocalChangeBroadcaster, MemoryStorage, MessageService, MessageServiceDependencies,
    PasswordHasher, PasswordHasherError, RankingService, RankingServiceDependencies, RoomService,
    RoomServiceDependencies, SystemClock, UserService, UserServiceDependencies,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use domain::PasswordHash;
use serde_json::{json, Value};
use tower::ServiceExt;

use web_api::{router, AppState};

/// 明文对照的假哈希器，接口测试不跑真正的 bcrypt。
struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{plaintext}"))
            .map_err(|err| PasswordHasherError::hashing(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain:{plaintext}"))
    }
}

/// 在内存存储上装配整套服务，路由形态与生产一致。
pub fn build_router() -> Router {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(SystemClock::default());
    let broadcaster = Arc::new(LocalChangeBroadcaster::default());
    let password_hasher = Arc::new(PlainPasswordHasher);

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository: storage.clone(),
        password_hasher,
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let room_service = Arc::new(RoomService::new(RoomServiceDependencies {
        room_repository: storage.clone(),
        membership_repository: storage.clone(),
        user_repository: storage.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        user_repository: storage.clone(),
        room_repository: storage.clone(),
        membership_repository: storage.clone(),
        message_repository: storage.clone(),
        reaction_repository: storage.clone(),
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
    }));
    let ranking_service = Arc::new(RankingService::new(RankingServiceDependencies {
        user_repository: storage.clone(),
        message_repository: storage.clone(),
        reaction_repository: storage.clone(),
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
    router(state)
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// 注册一个普通成员，非 201 直接失败。
pub async fn register(app: &Router, login: &str) {
    let (status, _) = send_request(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "login": login, "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}
