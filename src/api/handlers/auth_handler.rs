use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    api::{app_state::AppState, dto::auth_dto::*},
    error::EngineError,
};

/// 校验用户口令（透传到谓词后端）
pub async fn check_user(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let store = state.store.clone();
    let valid = tokio::task::spawn_blocking(move || {
        store.check_user(&request.userid, &request.password, &request.botid)
    })
    .await
    .map_err(|e| EngineError::Internal(e.to_string()))??;

    Ok(Json(CheckUserResponse { valid }))
}

/// 创建用户；重复的 userid 返回 409
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        store.create_user(&request.userid, &request.password, &request.botid)
    })
    .await
    .map_err(|e| EngineError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(AuthOkResponse { ok: true })))
}

/// 修改口令
pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<impl IntoResponse, EngineError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || {
        store.change_password(&request.userid, &request.password, &request.botid)
    })
    .await
    .map_err(|e| EngineError::Internal(e.to_string()))??;

    Ok(Json(AuthOkResponse { ok: true }))
}
