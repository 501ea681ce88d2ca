//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod auth_dto;
pub mod bot_dto;
pub mod talk_dto;

pub use auth_dto::*;
pub use bot_dto::*;
pub use talk_dto::*;
