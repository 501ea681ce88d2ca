use crate::config::config::EngineConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. ./colloquy.toml
    /// 2. 环境变量
    pub fn load() -> Result<EngineConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file("colloquy.toml"))
            .merge(Env::prefixed("COLLOQUY_").split("_").global());

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<EngineConfig, figment::Error> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("COLLOQUY_").split("_").global());

        figment.extract()
    }

    /// 验证配置
    ///
    /// 启动期的配置违例必须大声失败，而不是带病运行。
    pub fn validate(config: &EngineConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.predicates.cache_max == 0 {
            return Err(ConfigValidationError::InvalidCacheMax);
        }

        if config.interpreter.max_depth == 0 {
            return Err(ConfigValidationError::InvalidMaxDepth);
        }

        if config.bots.is_empty() {
            return Err(ConfigValidationError::NoBots);
        }

        if config.bots.iter().any(|b| b.id.is_empty()) {
            return Err(ConfigValidationError::EmptyBotId);
        }

        match config.storage.backend.as_str() {
            "memory" | "flatfile" | "sqlite" => {}
            other => return Err(ConfigValidationError::UnknownBackend(other.to_string())),
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("谓词缓存上限无效，必须大于 0")]
    InvalidCacheMax,

    #[error("srai 递归深度上限无效，必须大于 0")]
    InvalidMaxDepth,

    #[error("未配置任何 bot")]
    NoBots,

    #[error("bot 标识不能为空")]
    EmptyBotId,

    #[error("未知的存储后端: {0}")]
    UnknownBackend(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("colloquy.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}
