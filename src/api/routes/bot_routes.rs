//! Bot Routes
//!
//! 定义 bot 查询的 API 路由。

use crate::api::handlers::bot_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建 bot 路由器
pub fn create_bot_router() -> Router<AppState> {
    Router::new()
        .route("/bots", get(list_bots))
        .route("/bots/:id", get(get_bot))
}
