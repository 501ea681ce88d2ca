//! Colloquy - 规则驱动的对话引擎
//!
//! 基于 (pattern, that, topic) 三元组的通配符字典树匹配规则库，
//! 为每个 (userid, botid) 会话维护有界的谓词缓存，并通过递归的
//! 模板解释器生成回复。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
