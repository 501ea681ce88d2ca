//! SQLite 谓词后端
//!
//! `predicates` 表以 (userid, botid, name) 为主键，写入为 upsert；
//! `users` 表支撑认证透传接口。

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use crate::error::{EngineError, Result};
use crate::storage::store::PredicateStore;

/// SQLite 实现
pub struct SqlitePredicateStore {
    conn: Mutex<Connection>,
}

impl SqlitePredicateStore {
    /// 打开（或创建）数据库文件并建表
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 内存数据库（测试用）
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS predicates (
                userid TEXT NOT NULL,
                botid  TEXT NOT NULL,
                name   TEXT NOT NULL,
                value  TEXT NOT NULL,
                PRIMARY KEY (userid, botid, name)
            );
            CREATE TABLE IF NOT EXISTS users (
                userid   TEXT NOT NULL,
                botid    TEXT NOT NULL,
                password TEXT NOT NULL,
                PRIMARY KEY (userid, botid)
            );",
        )?;
        Ok(())
    }
}

impl PredicateStore for SqlitePredicateStore {
    fn load(&self, name: &str, userid: &str, botid: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM predicates WHERE userid = ?1 AND botid = ?2 AND name = ?3",
                params![userid, botid, name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, name: &str, value: &str, userid: &str, botid: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO predicates (userid, botid, name, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (userid, botid, name) DO UPDATE SET value = excluded.value",
            params![userid, botid, name, value],
        )?;
        Ok(())
    }

    fn check_user(&self, userid: &str, password: &str, botid: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let stored = conn
            .query_row(
                "SELECT password FROM users WHERE userid = ?1 AND botid = ?2",
                params![userid, botid],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(stored.is_some_and(|p| p == password))
    }

    fn create_user(&self, userid: &str, password: &str, botid: &str) -> Result<()> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (userid, botid, password) VALUES (?1, ?2, ?3)",
            params![userid, botid, password],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(EngineError::UserAlreadyExists(userid.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn change_password(&self, userid: &str, password: &str, botid: &str) -> Result<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET password = ?3 WHERE userid = ?1 AND botid = ?2",
            params![userid, botid, password],
        )?;
        if updated == 0 {
            return Err(EngineError::NotFound(format!("user {}", userid)));
        }
        Ok(())
    }

    fn user_count(&self, botid: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE botid = ?1",
            params![botid],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_on_write() {
        let store = SqlitePredicateStore::in_memory().unwrap();
        store.save("mood", "happy", "alice", "demo").unwrap();
        store.save("mood", "tired", "alice", "demo").unwrap();
        assert_eq!(
            store.load("mood", "alice", "demo").unwrap(),
            Some("tired".to_string())
        );
    }

    #[test]
    fn test_scoping_by_user_and_bot() {
        let store = SqlitePredicateStore::in_memory().unwrap();
        store.save("mood", "happy", "alice", "demo").unwrap();
        assert_eq!(store.load("mood", "alice", "other").unwrap(), None);
        assert_eq!(store.load("mood", "bob", "demo").unwrap(), None);
    }

    #[test]
    fn test_duplicate_user_is_checked_error() {
        let store = SqlitePredicateStore::in_memory().unwrap();
        store.create_user("alice", "secret", "demo").unwrap();
        let err = store.create_user("alice", "other", "demo").unwrap_err();
        assert!(matches!(err, EngineError::UserAlreadyExists(_)));
    }

    #[test]
    fn test_check_and_change_password() {
        let store = SqlitePredicateStore::in_memory().unwrap();
        store.create_user("alice", "secret", "demo").unwrap();
        assert!(store.check_user("alice", "secret", "demo").unwrap());
        assert!(!store.check_user("alice", "wrong", "demo").unwrap());
        assert!(!store.check_user("ghost", "secret", "demo").unwrap());

        store.change_password("alice", "new", "demo").unwrap();
        assert!(store.check_user("alice", "new", "demo").unwrap());
        assert!(store.change_password("ghost", "x", "demo").is_err());

        assert_eq!(store.user_count("demo").unwrap(), 1);
    }
}
