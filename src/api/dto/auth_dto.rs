//! 认证 DTO
//!
//! 认证透传接口的请求与响应结构。

use serde::{Deserialize, Serialize};

/// 认证请求（check/create/password 共用）
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AuthRequest {
    /// 用户标识
    pub userid: String,
    /// 口令
    pub password: String,
    /// bot 标识
    pub botid: String,
}

/// 校验响应
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckUserResponse {
    /// 用户口令是否有效
    pub valid: bool,
}

/// 通用确认响应
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthOkResponse {
    /// 操作结果
    pub ok: bool,
}
