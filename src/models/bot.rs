//! Bot 模型
//!
//! Bot 承载只读的属性表、替换表、句子分隔符与谓词信息，
//! 加载后由该 bot 的所有会话共享。

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::config::BotConfig;
use crate::models::predicate::PredicateInfo;

/// 替换表类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionKind {
    /// 输入归一化
    Input,
    /// gender 标签
    Gender,
    /// person 标签
    Person,
    /// person2 标签
    Person2,
}

/// 单个 bot
#[derive(Debug, Clone)]
pub struct Bot {
    /// bot 标识
    pub id: String,
    /// 属性表
    properties: HashMap<String, String>,
    /// 谓词信息
    predicates_info: HashMap<String, PredicateInfo>,
    /// 有序替换表
    input_substitutions: Vec<(String, String)>,
    gender_substitutions: Vec<(String, String)>,
    person_substitutions: Vec<(String, String)>,
    person2_substitutions: Vec<(String, String)>,
    /// 句子分隔符
    sentence_splitters: Vec<String>,
}

impl Bot {
    /// 从配置构建 bot
    pub fn from_config(config: &BotConfig) -> Self {
        let predicates_info = config
            .predicates
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    PredicateInfo {
                        default: p.default.clone(),
                        return_name_when_set: p.return_name_when_set,
                    },
                )
            })
            .collect();

        let splitters = if config.sentence_splitters.is_empty() {
            crate::config::config::default_sentence_splitters()
        } else {
            config.sentence_splitters.clone()
        };

        Self {
            id: config.id.clone(),
            properties: config.properties.clone(),
            predicates_info,
            input_substitutions: config.substitutions.input.clone(),
            gender_substitutions: config.substitutions.gender.clone(),
            person_substitutions: config.substitutions.person.clone(),
            person2_substitutions: config.substitutions.person2.clone(),
            sentence_splitters: splitters,
        }
    }

    /// 读取属性值
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// 属性表
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// 谓词信息
    pub fn predicate_info(&self, name: &str) -> Option<&PredicateInfo> {
        self.predicates_info.get(name)
    }

    /// 指定类别的替换表
    pub fn substitutions(&self, kind: SubstitutionKind) -> &[(String, String)] {
        match kind {
            SubstitutionKind::Input => &self.input_substitutions,
            SubstitutionKind::Gender => &self.gender_substitutions,
            SubstitutionKind::Person => &self.person_substitutions,
            SubstitutionKind::Person2 => &self.person2_substitutions,
        }
    }

    /// 句子分隔符
    pub fn sentence_splitters(&self) -> &[String] {
        &self.sentence_splitters
    }
}

/// bot 注册表，加载后只读
#[derive(Debug, Clone, Default)]
pub struct Bots {
    bots: HashMap<String, Arc<Bot>>,
}

impl Bots {
    /// 从配置构建注册表
    pub fn from_configs(configs: &[BotConfig]) -> Self {
        let bots = configs
            .iter()
            .map(|c| (c.id.clone(), Arc::new(Bot::from_config(c))))
            .collect();
        Self { bots }
    }

    /// 按 id 获取 bot
    pub fn get(&self, botid: &str) -> Option<Arc<Bot>> {
        self.bots.get(botid).cloned()
    }

    /// 所有 bot id
    pub fn ids(&self) -> Vec<String> {
        self.bots.keys().cloned().collect()
    }

    /// bot 数量
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::{PredicateInfoConfig, SubstitutionsConfig};

    fn sample_config() -> BotConfig {
        BotConfig {
            id: "demo".into(),
            properties: HashMap::from([("name".into(), "Demo".into())]),
            predicates: vec![PredicateInfoConfig {
                name: "name".into(),
                default: "friend".into(),
                return_name_when_set: true,
            }],
            substitutions: SubstitutionsConfig {
                input: vec![("don't".into(), "do not".into())],
                ..Default::default()
            },
            sentence_splitters: vec![],
            rule_files: vec![],
        }
    }

    #[test]
    fn test_bot_from_config() {
        let bot = Bot::from_config(&sample_config());
        assert_eq!(bot.property("name"), Some("Demo"));
        assert!(bot.predicate_info("name").unwrap().return_name_when_set);
        assert_eq!(bot.substitutions(SubstitutionKind::Input).len(), 1);
        // 未配置分隔符时回落到默认表
        assert!(!bot.sentence_splitters().is_empty());
    }

    #[test]
    fn test_bots_registry_lookup() {
        let bots = Bots::from_configs(&[sample_config()]);
        assert!(bots.get("demo").is_some());
        assert!(bots.get("missing").is_none());
        assert_eq!(bots.len(), 1);
    }
}
