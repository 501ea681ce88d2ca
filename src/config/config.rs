use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::models::category::MergePolicy;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 是否记录每轮对话事件
    pub log_chat: bool,
}

/// 匹配配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatchingConfig {
    /// 路径重复时的合并策略
    pub merge_policy: MergePolicy,
    /// APPEND 策略下模板之间插入的分隔串
    pub merge_append_separator: String,
    /// 是否对每次合并记录警告日志
    pub note_each_merge: bool,
    /// 单次响应的超时（毫秒），匹配与 srai 递归共享同一截止时间
    pub response_timeout_ms: u64,
}

/// 谓词缓存配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PredicatesConfig {
    /// 缓存中谓词值总数上限，达到后触发换出
    pub cache_max: usize,
    /// 未设置谓词的全局默认值
    pub empty_default: String,
    /// 索引谓词保留的最大条目数
    pub max_index: usize,
}

/// 随机选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RandomStrategy {
    /// 纯随机
    PureRandom,
    /// 不重复（洗牌袋）
    NonRepeating,
}

impl Default for RandomStrategy {
    fn default() -> Self {
        RandomStrategy::PureRandom
    }
}

/// 模板解释器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InterpreterConfig {
    /// srai 递归深度上限
    pub max_depth: usize,
    /// 检测到循环归约时替换的哨兵输入
    pub infinite_loop_input: String,
    /// random 标签的选择策略
    pub random_strategy: RandomStrategy,
    /// 是否允许 system 标签执行外部命令
    pub allow_os_access: bool,
    /// system 命令的工作目录
    pub system_directory: PathBuf,
    /// system 命令的前缀（如解释器路径）
    pub system_prefix: Option<String>,
}

/// 谓词存储后端配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// 后端类型: "memory"、"flatfile" 或 "sqlite"
    pub backend: String,
    /// flatfile 后端的数据目录
    pub data_dir: PathBuf,
    /// sqlite 后端的数据库文件
    pub sqlite_path: PathBuf,
}

/// 单个谓词的配置信息
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PredicateInfoConfig {
    /// 谓词名
    pub name: String,
    /// 谓词默认值
    pub default: String,
    /// set 之后返回谓词名而非值
    pub return_name_when_set: bool,
}

/// 单个 bot 的替换表配置
///
/// 每个表是有序的 (查找, 替换) 对序列，按声明顺序应用。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubstitutionsConfig {
    /// 输入归一化替换
    pub input: Vec<(String, String)>,
    /// gender 替换
    pub gender: Vec<(String, String)>,
    /// person 替换（第一/第三人称互换）
    pub person: Vec<(String, String)>,
    /// person2 替换（第一/第二人称互换）
    pub person2: Vec<(String, String)>,
}

/// 单个 bot 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    /// bot 标识
    pub id: String,
    /// 属性表（name、master 等，bot 标签读取）
    pub properties: HashMap<String, String>,
    /// 谓词信息
    pub predicates: Vec<PredicateInfoConfig>,
    /// 替换表
    pub substitutions: SubstitutionsConfig,
    /// 句子分隔符
    pub sentence_splitters: Vec<String>,
    /// 规则文件路径（AIML）
    pub rule_files: Vec<PathBuf>,
}

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 匹配配置
    pub matching: MatchingConfig,
    /// 谓词缓存配置
    pub predicates: PredicatesConfig,
    /// 模板解释器配置
    pub interpreter: InterpreterConfig,
    /// 存储后端配置
    pub storage: StorageConfig,
    /// bot 定义
    pub bots: Vec<BotConfig>,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl EngineConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 2001,
                request_timeout: 30,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                log_chat: true,
            },
            matching: MatchingConfig {
                merge_policy: MergePolicy::Combine,
                merge_append_separator: " ".into(),
                note_each_merge: true,
                response_timeout_ms: 1000,
            },
            predicates: PredicatesConfig {
                cache_max: 500,
                empty_default: String::new(),
                max_index: 5,
            },
            interpreter: InterpreterConfig {
                max_depth: 24,
                infinite_loop_input: "INFINITE LOOP".into(),
                random_strategy: RandomStrategy::PureRandom,
                allow_os_access: false,
                system_directory: PathBuf::from("."),
                system_prefix: None,
            },
            storage: StorageConfig {
                backend: "memory".into(),
                data_dir: PathBuf::from("./data/predicates"),
                sqlite_path: PathBuf::from("./data/colloquy.db"),
            },
            bots: vec![BotConfig {
                id: "demo".into(),
                properties: HashMap::from([
                    ("name".into(), "Demo".into()),
                    ("master".into(), "unknown".into()),
                ]),
                predicates: vec![PredicateInfoConfig {
                    name: "name".into(),
                    default: "friend".into(),
                    return_name_when_set: false,
                }],
                substitutions: SubstitutionsConfig::default(),
                sentence_splitters: default_sentence_splitters(),
                rule_files: vec![],
            }],
            app_name: "colloquy".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.matching.note_each_merge = false;
        config.storage.backend = "sqlite".into();
        config
    }
}

/// 默认句子分隔符
pub fn default_sentence_splitters() -> Vec<String> {
    vec![".".into(), "!".into(), "?".into(), ";".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_valid() {
        let config = EngineConfig::development();
        assert!(config.predicates.cache_max > 0);
        assert!(config.interpreter.max_depth > 0);
        assert_eq!(config.bots.len(), 1);
        assert_eq!(config.matching.merge_policy, MergePolicy::Combine);
    }

    #[test]
    fn test_production_overrides() {
        let config = EngineConfig::production();
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.storage.backend, "sqlite");
    }

    #[test]
    fn test_random_strategy_deserialize() {
        let strategy: RandomStrategy = serde_json::from_str("\"non-repeating\"").unwrap();
        assert_eq!(strategy, RandomStrategy::NonRepeating);
    }
}
