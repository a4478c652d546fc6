use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, patch, post, put},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::{
    AuthenticateRequest, CreateRoomRequest, DeleteMessageRequest, EditMessageRequest, EventStream,
    GrantBonusRequest, LeaderboardEntryDto, LeaveRoomRequest, MessageDto, PostMessageRequest,
    ProfileDto, RegisterRequest, RoomDto, SessionDto, SetMuteRequest, SetRoleRequest,
    ToggleReactionRequest, UpdateBioRequest, UserDto,
};
use domain::{Role, RoomId};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    login: String,
    password: String,
    #[serde(default)]
    bio: String,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    login: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CreateRoomPayload {
    name: String,
    creator: String,
    #[serde(default)]
    invitees: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessagePayload {
    author: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct EditMessagePayload {
    editor: String,
    body: String,
}

/// 操作者放在请求体里的变更请求共用这个载荷。
#[derive(Debug, Deserialize)]
struct ActorPayload {
    actor: String,
}

/// 操作者放在查询串里的读取/删除请求共用这个载荷。
#[derive(Debug, Deserialize)]
struct ActorQuery {
    actor: String,
}

#[derive(Debug, Deserialize)]
struct BioPayload {
    bio: String,
}

#[derive(Debug, Deserialize)]
struct RolePayload {
    acted_by: String,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct MutePayload {
    acted_by: String,
    /// Some 为禁言分钟数，None 为解除。
    minutes: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BonusPayload {
    granted_by: String,
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    liked: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .route("/ws", get(websocket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_user))
        .route("/auth/login", post(login_user))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{room_id}/leave", post(leave_room))
        .route(
            "/rooms/{room_id}/messages",
            get(list_messages).post(post_message),
        )
        .route(
            "/messages/{message_id}",
            patch(edit_message).delete(delete_message),
        )
        .route("/messages/{message_id}/reactions", post(toggle_reaction))
        .route("/users/{login}/profile", get(get_profile))
        .route("/users/{login}/bio", put(update_bio))
        .route("/users/{login}/role", put(set_role))
        .route("/users/{login}/mute", put(set_mute))
        .route("/users/{login}/bonus", post(grant_bonus))
        .route("/leaderboard", get(leaderboard))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let dto = state
        .user_service
        .register(RegisterRequest {
            login: payload.login,
            password: payload.password,
            bio: payload.bio,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<SessionDto>, ApiError> {
    let dto = state
        .user_service
        .authenticate(AuthenticateRequest {
            login: payload.login,
            password: payload.password,
        })
        .await?;

    Ok(Json(dto))
}

async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<RoomDto>>, ApiError> {
    let rooms = state.room_service.list_rooms(&query.actor).await?;
    Ok(Json(rooms))
}

async fn create_room(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<RoomDto>), ApiError> {
    let dto = state
        .room_service
        .create_room(CreateRoomRequest {
            name: payload.name,
            creator: payload.creator,
            invitees: payload.invitees,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(payload): Json<ActorPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .room_service
        .leave_room(LeaveRoomRequest {
            room_id,
            actor: payload.actor,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let items = state
        .message_service
        .list_messages(room_id, &query.actor)
        .await?;

    Ok(Json(items))
}

async fn post_message(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Json(payload): Json<PostMessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let dto = state
        .message_service
        .post_message(PostMessageRequest {
            room_id,
            author: payload.author,
            body: payload.body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

async fn edit_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(payload): Json<EditMessagePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .message_service
        .edit_message(EditMessageRequest {
            message_id,
            editor: payload.editor,
            body: payload.body,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .message_service
        .delete_message(DeleteMessageRequest {
            message_id,
            deleted_by: query.actor,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_reaction(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Json(payload): Json<ActorPayload>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let liked = state
        .message_service
        .toggle_reaction(ToggleReactionRequest {
            message_id,
            actor: payload.actor,
        })
        .await?;

    Ok(Json(ToggleResponse { liked }))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(login): Path<String>,
) -> Result<Json<ProfileDto>, ApiError> {
    let profile = state.ranking_service.profile(&login).await?;
    Ok(Json(profile))
}

async fn update_bio(
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<BioPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .update_bio(UpdateBioRequest {
            login,
            bio: payload.bio,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn set_role(
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<RolePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .set_role(SetRoleRequest {
            acted_by: payload.acted_by,
            target: login,
            role: payload.role,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn set_mute(
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<MutePayload>,
) -> Result<StatusCode, ApiError> {
    state
        .user_service
        .set_mute(SetMuteRequest {
            acted_by: payload.acted_by,
            target: login,
            duration_minutes: payload.minutes,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn grant_bonus(
    State(state): State<AppState>,
    Path(login): Path<String>,
    Json(payload): Json<BonusPayload>,
) -> Result<StatusCode, ApiError> {
    state
        .ranking_service
        .grant_bonus(GrantBonusRequest {
            granted_by: payload.granted_by,
            target: login,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntryDto>>, ApiError> {
    let entries = state.ranking_service.leaderboard().await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    room_id: Option<i64>,
}

async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    // 订阅在升级应答之前建立，握手完成后的事件不会漏掉。
    let stream = EventStream::new(
        state.broadcaster.subscribe(),
        query.room_id.map(RoomId::new),
    );
    ws.on_upgrade(move |socket| websocket_handler(socket, stream))
}

async fn websocket_handler(socket: WebSocket, mut stream: EventStream) {
    let (mut sender, mut incoming) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to serialize websocket payload");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // 客户端不上行业务数据，读到关闭帧即结束。
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            if matches!(message, WsMessage::Close(_)) {
                break;
            }
        }
    });

    let _ = tokio::join!(send_task, recv_task);
}
