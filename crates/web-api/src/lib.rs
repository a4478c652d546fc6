//! Web API 层。
//!
//! Axum 路由与 WebSocket 变更推送，把 HTTP 请求翻译成应用层的用例调用。

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
