//! 分类与匹配结果
//!
//! 一条分类是 (pattern, that, topic) 到模板的映射；匹配结果携带
//! 命中的模板与按从左到右顺序捕获的通配符内容。

use serde::{Deserialize, Serialize};

use crate::models::template::Element;

/// 路径重复时的合并策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// 保留先加载的模板，忽略新模板
    Skip,
    /// 用新模板覆盖已存储的模板
    Overwrite,
    /// 在可配置分隔串之后拼接新模板
    Append,
    /// 两个模板并存，后续匹配时等概率选择
    Combine,
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::Combine
    }
}

/// 一条规则分类
///
/// 插入后不可变，仅能通过显式合并更新。
#[derive(Debug, Clone)]
pub struct Category {
    /// 匹配模式
    pub pattern: String,
    /// 前一轮回复的上下文模式
    pub that: String,
    /// 话题上下文模式
    pub topic: String,
    /// 模板
    pub template: Element,
    /// 来源（文件路径或 "learn"）
    pub source: String,
    /// 所属 bot
    pub bot_id: String,
}

impl Category {
    /// 创建分类；that/topic 为空时归一为 "*"
    pub fn new(pattern: &str, that: &str, topic: &str, template: Element) -> Self {
        Self {
            pattern: pattern.to_string(),
            that: if that.is_empty() { "*".into() } else { that.to_string() },
            topic: if topic.is_empty() { "*".into() } else { topic.to_string() },
            template,
            source: String::new(),
            bot_id: String::new(),
        }
    }
}

/// 匹配结果
///
/// 每个星号列表的条目数等于对应路径段里的通配符个数，顺序为
/// 从左到右。
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// 命中的模板
    pub template: Element,
    /// pattern 段捕获
    pub pattern_stars: Vec<String>,
    /// that 段捕获
    pub that_stars: Vec<String>,
    /// topic 段捕获
    pub topic_stars: Vec<String>,
    /// 命中的完整路径（用于日志）
    pub path: String,
    /// 命中分类的来源
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_defaults_to_wildcard() {
        let category = Category::new("HELLO", "", "", Element::new("template"));
        assert_eq!(category.that, "*");
        assert_eq!(category.topic, "*");
    }

    #[test]
    fn test_merge_policy_deserialize() {
        let policy: MergePolicy = serde_json::from_str("\"append\"").unwrap();
        assert_eq!(policy, MergePolicy::Append);
        assert_eq!(MergePolicy::default(), MergePolicy::Combine);
    }
}
