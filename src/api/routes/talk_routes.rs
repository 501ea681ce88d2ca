//! Talk Routes
//!
//! 定义对话相关的 API 路由。

use crate::api::handlers::talk_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建对话路由器
pub fn create_talk_router() -> Router<AppState> {
    Router::new().route("/talk", post(talk))
}
