//! Auth Routes
//!
//! 定义认证透传的 API 路由。

use crate::api::handlers::auth_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建认证路由器
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/check", post(check_user))
        .route("/auth/create", post(create_user))
        .route("/auth/password", post(change_password))
}
