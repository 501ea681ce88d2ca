//! 内存谓词后端
//!
//! 测试与开发环境使用的后端：进程内保存，认证全部放行。

use dashmap::DashMap;
use std::collections::HashMap;

use crate::error::Result;
use crate::storage::store::PredicateStore;

/// 内存实现
#[derive(Default)]
pub struct InMemoryPredicateStore {
    values: DashMap<(String, String), HashMap<String, String>>,
}

impl InMemoryPredicateStore {
    /// 创建空后端
    pub fn new() -> Self {
        Self::default()
    }

    fn key(userid: &str, botid: &str) -> (String, String) {
        (userid.to_string(), botid.to_string())
    }
}

impl PredicateStore for InMemoryPredicateStore {
    fn load(&self, name: &str, userid: &str, botid: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .get(&Self::key(userid, botid))
            .and_then(|map| map.get(name).cloned()))
    }

    fn save(&self, name: &str, value: &str, userid: &str, botid: &str) -> Result<()> {
        self.values
            .entry(Self::key(userid, botid))
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn check_user(&self, _userid: &str, _password: &str, _botid: &str) -> Result<bool> {
        Ok(true)
    }

    fn create_user(&self, _userid: &str, _password: &str, _botid: &str) -> Result<()> {
        Ok(())
    }

    fn change_password(&self, _userid: &str, _password: &str, _botid: &str) -> Result<()> {
        Ok(())
    }

    fn user_count(&self, botid: &str) -> Result<usize> {
        Ok(self
            .values
            .iter()
            .filter(|entry| entry.key().1 == botid)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let store = InMemoryPredicateStore::new();
        store.save("mood", "happy", "alice", "demo").unwrap();
        assert_eq!(
            store.load("mood", "alice", "demo").unwrap(),
            Some("happy".to_string())
        );
        assert_eq!(store.load("mood", "bob", "demo").unwrap(), None);
    }

    #[test]
    fn test_auth_accepts_all() {
        let store = InMemoryPredicateStore::new();
        assert!(store.check_user("anyone", "anything", "demo").unwrap());
        assert!(store.create_user("anyone", "anything", "demo").is_ok());
    }
}
