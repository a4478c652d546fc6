mod support;

use axum::http::StatusCode;
use serde_json::json;

use support::{build_router, delete_request, get_request, json_request, register, send_request};

#[tokio::test]
async fn register_login_and_post_flow() {
    let app = build_router();

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "login": "alice", "password": "secret", "bio": "hi there" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["login"], "alice");
    assert_eq!(body["role"], "User");
    assert_eq!(body["bio"], "hi there");

    // 重名注册被唯一键挡掉。
    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "login": "alice", "password": "other" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "LOGIN_TAKEN");

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "login": "alice", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "login": "alice", "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "alice");
    assert_eq!(body["role"], "User");

    // 公共聊天室无需加入即可发言。
    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms/1/messages",
            json!({ "author": "alice", "body": "hello world" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["room_id"], 1);
    assert_eq!(body["author"], "alice");
    assert_eq!(body["author_role"], "User");
    assert_eq!(body["body"], "hello world");
    assert_eq!(body["like_count"], 0);

    let (status, body) = send_request(
        &app,
        get_request("/api/v1/rooms/1/messages?actor=alice"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("message list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["body"], "hello world");
}

#[tokio::test]
async fn reactions_feed_profiles_and_leaderboard() {
    let app = build_router();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (status, posted) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms/1/messages",
            json!({ "author": "alice", "body": "rate my setup" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = posted["id"].as_i64().expect("message id");

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/messages/{message_id}/reactions"),
            json!({ "actor": "bob" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    // 点赞方视角能看到自己的标记。
    let (status, body) = send_request(
        &app,
        get_request("/api/v1/rooms/1/messages?actor=bob"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["like_count"], 1);
    assert_eq!(body[0]["liked_by_me"], true);

    let (status, body) = send_request(
        &app,
        get_request("/api/v1/users/alice/profile"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["xp"], 15);
    assert_eq!(body["title"], "Novice");
    assert_eq!(body["accent"], "#ffffff");

    // 再点一次撤销，经验值跟着回落。
    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/messages/{message_id}/reactions"),
            json!({ "actor": "bob" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], false);

    let (status, body) = send_request(&app, get_request("/api/v1/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().expect("leaderboard");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["login"], "alice");
    assert_eq!(entries[0]["xp"], 5);
    assert_eq!(entries[1]["login"], "bob");
    assert_eq!(entries[1]["xp"], 0);
}

#[tokio::test]
async fn private_rooms_gate_access() {
    let app = build_router();
    register(&app, "alice").await;
    register(&app, "bob").await;
    register(&app, "carol").await;

    let (status, room) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms",
            json!({ "name": "team", "creator": "alice", "invitees": ["bob"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["kind"], "Private");
    let room_id = room["id"].as_i64().expect("room id");

    // 受邀成员能看到房间，旁人只看到公共聊天室。
    let (status, body) = send_request(&app, get_request("/api/v1/rooms?actor=bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("rooms").len(), 2);

    let (status, body) = send_request(&app, get_request("/api/v1/rooms?actor=carol")).await;
    assert_eq!(status, StatusCode::OK);
    let rooms = body.as_array().expect("rooms");
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "general");

    let (status, body) = send_request(
        &app,
        get_request(&format!("/api/v1/rooms/{room_id}/messages?actor=carol")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ROOM_MEMBER");

    let (status, _) = send_request(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{room_id}/messages"),
            json!({ "author": "bob", "body": "invited and posting" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_request(
        &app,
        json_request(
            "POST",
            &format!("/api/v1/rooms/{room_id}/leave"),
            json!({ "actor": "bob" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // 退出后立即失去读写权。
    let (status, body) = send_request(
        &app,
        get_request(&format!("/api/v1/rooms/{room_id}/messages?actor=bob")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_ROOM_MEMBER");
}

#[tokio::test]
async fn message_edit_and_delete_authority() {
    let app = build_router();
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (_, posted) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms/1/messages",
            json!({ "author": "alice", "body": "first draft" }),
        ),
    )
    .await;
    let message_id = posted["id"].as_i64().expect("message id");

    // 编辑只属于作者本人。
    let (status, body) = send_request(
        &app,
        json_request(
            "PATCH",
            &format!("/api/v1/messages/{message_id}"),
            json!({ "editor": "bob", "body": "hijacked" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");

    let (status, _) = send_request(
        &app,
        json_request(
            "PATCH",
            &format!("/api/v1/messages/{message_id}"),
            json!({ "editor": "alice", "body": "final draft" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send_request(
        &app,
        get_request("/api/v1/rooms/1/messages?actor=bob"),
    )
    .await;
    assert_eq!(body[0]["body"], "final draft");

    let (status, _) = send_request(
        &app,
        delete_request(&format!("/api/v1/messages/{message_id}?actor=bob")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_request(
        &app,
        delete_request(&format!("/api/v1/messages/{message_id}?actor=alice")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send_request(
        &app,
        get_request("/api/v1/rooms/1/messages?actor=alice"),
    )
    .await;
    assert_eq!(body.as_array().expect("messages").len(), 0);
}

#[tokio::test]
async fn validation_and_error_statuses() {
    let app = build_router();
    register(&app, "alice").await;

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            json!({ "login": "   ", "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    let (status, _) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms/1/messages",
            json!({ "author": "alice", "body": "   " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send_request(
        &app,
        json_request(
            "POST",
            "/api/v1/rooms/99/messages",
            json!({ "author": "alice", "body": "anyone here?" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROOM_NOT_FOUND");

    let (status, body) = send_request(
        &app,
        get_request("/api/v1/users/nobody/profile"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");

    let (status, _) = send_request(&app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
