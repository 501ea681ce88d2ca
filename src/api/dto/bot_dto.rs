//! Bot DTO
//!
//! 定义 bot 查询的响应数据结构。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// bot 列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct BotListResponse {
    /// 所有 bot 标识
    pub bots: Vec<String>,
    /// 已加载分类总数
    pub categories: usize,
}

/// 单个 bot 详情
#[derive(Debug, Serialize, Deserialize)]
pub struct BotDetailResponse {
    /// bot 标识
    pub id: String,
    /// 属性表
    pub properties: HashMap<String, String>,
    /// 已知用户数
    pub user_count: usize,
}
