use axum::{Json, extract::State, response::IntoResponse};
use std::time::Instant;
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::talk_dto::*},
    error::EngineError,
};

/// 对话入口：一次完整的 match + evaluate 轮次。
///
/// 引擎核心是同步的且可能触达磁盘，放到阻塞线程池执行。
pub async fn talk(
    State(state): State<AppState>,
    Json(request): Json<TalkRequest>,
) -> Result<impl IntoResponse, EngineError> {
    if request.userid.is_empty() || request.botid.is_empty() {
        return Err(EngineError::Validation(
            "userid 和 botid 不能为空".to_string(),
        ));
    }
    debug!(userid = %request.userid, botid = %request.botid, "talk request");

    let chat = state.chat.clone();
    let userid = request.userid.clone();
    let botid = request.botid.clone();
    let started = Instant::now();

    let reply = tokio::task::spawn_blocking(move || {
        chat.get_response(&request.input, &request.userid, &request.botid)
    })
    .await
    .map_err(|e| EngineError::Internal(e.to_string()))??;

    Ok(Json(TalkResponse {
        reply,
        userid,
        botid,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }))
}
