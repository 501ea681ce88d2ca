use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    api::{app_state::AppState, dto::bot_dto::*},
    error::EngineError,
};

/// 列出所有 bot
pub async fn list_bots(State(state): State<AppState>) -> impl IntoResponse {
    let mut bots = state.chat.bots().ids();
    bots.sort();
    Json(BotListResponse {
        bots,
        categories: state.chat.category_count(),
    })
}

/// 查询单个 bot 的属性
pub async fn get_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let bot = state
        .chat
        .bots()
        .get(&id)
        .ok_or_else(|| EngineError::NotFound(format!("bot {}", id)))?;

    let store = state.store.clone();
    let botid = id.clone();
    let user_count = tokio::task::spawn_blocking(move || store.user_count(&botid))
        .await
        .map_err(|e| EngineError::Internal(e.to_string()))?
        .unwrap_or(0);

    Ok(Json(BotDetailResponse {
        id,
        properties: bot.properties().clone(),
        user_count,
    }))
}
