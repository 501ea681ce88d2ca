//! 错误处理模块
//!
//! 定义引擎的错误类型和错误处理逻辑。
//!
//! 可恢复的未命中（无匹配分类、无谓词值）不属于错误，由调用方以
//! `Option` 分支处理；这里只保留真正的失败。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 谓词后端存储错误
    #[error("存储错误: {0}")]
    Storage(String),

    /// 认证错误
    #[error("认证失败: {0}")]
    Authentication(String),

    /// 用户已存在（创建用户时）
    #[error("用户已存在: {0}")]
    UserAlreadyExists(String),

    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 响应超时
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 规则文件解析错误
    #[error("规则解析错误: {0}")]
    RuleParse(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 模板元素求值失败（元素级降级，不致命）
    #[error("求值错误: {0}")]
    Evaluation(String),

    /// 模板求值中的内部不变量违例
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for EngineError {
    fn from(e: figment::Error) -> Self {
        EngineError::Config(e.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}

impl From<quick_xml::Error> for EngineError {
    fn from(e: quick_xml::Error) -> Self {
        EngineError::RuleParse(e.to_string())
    }
}

/// Axum response implementation for EngineError
impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,
    /// 错误消息
    pub message: String,
    /// 详细信息
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&EngineError> for (u16, String) {
    fn from(err: &EngineError) -> (u16, String) {
        match err {
            EngineError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            EngineError::Authentication(_) => (401, "UNAUTHORIZED".to_string()),
            EngineError::UserAlreadyExists(_) => (409, "CONFLICT".to_string()),
            EngineError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            EngineError::Timeout(_) => (408, "TIMEOUT".to_string()),
            EngineError::Storage(_) => (500, "STORAGE_ERROR".to_string()),
            EngineError::RuleParse(_) => (500, "RULE_PARSE_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let err = EngineError::NotFound("bot".to_string());
        let (status, code): (u16, String) = (&err).into();
        assert_eq!(status, 404);
        assert_eq!(code, "NOT_FOUND");

        let err = EngineError::UserAlreadyExists("alice".to_string());
        let (status, _): (u16, String) = (&err).into();
        assert_eq!(status, 409);
    }

    #[test]
    fn test_error_response_structure() {
        let response = ErrorResponse::new("TIMEOUT", "操作超时").with_details("match expired");
        assert_eq!(response.code, "TIMEOUT");
        assert!(response.details.is_some());
    }
}
