//! 存储工厂模块
//!
//! 根据配置创建相应的谓词存储后端实例。

use std::sync::Arc;

use crate::config::config::StorageConfig;
use crate::error::{EngineError, Result};
use crate::storage::flat_file::FlatFilePredicateStore;
use crate::storage::memory::InMemoryPredicateStore;
use crate::storage::sqlite::SqlitePredicateStore;
use crate::storage::store::PredicateStore;

/// 根据配置创建后端
pub fn create_predicate_store(config: &StorageConfig) -> Result<Arc<dyn PredicateStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryPredicateStore::new())),
        "flatfile" => Ok(Arc::new(FlatFilePredicateStore::new(&config.data_dir))),
        "sqlite" => Ok(Arc::new(SqlitePredicateStore::new(&config.sqlite_path)?)),
        other => Err(EngineError::Config(format!("未知的存储后端: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_backend() {
        let config = StorageConfig {
            backend: "memory".into(),
            ..Default::default()
        };
        assert!(create_predicate_store(&config).is_ok());
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let config = StorageConfig {
            backend: "surreal".into(),
            ..Default::default()
        };
        assert!(create_predicate_store(&config).is_err());
    }
}
