//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod auth_handler;
pub mod bot_handler;
pub mod talk_handler;

pub use auth_handler::*;
pub use bot_handler::*;
pub use talk_handler::*;
