//! 谓词存储接口
//!
//! 谓词缓存换出与回载所依赖的后端接口。实现方只需要按
//! (userid, botid, name) 维度读写字符串值；认证族方法供对外的
//! 认证流程透传，不支持认证的后端全部放行。

use crate::error::Result;

/// 谓词持久化后端
///
/// 接口是同步的：flat-file 与 SQLite 都是阻塞 I/O，且缓存会在
/// 求值中途调用；异步边界放在 API 处理器的 `spawn_blocking` 上。
pub trait PredicateStore: Send + Sync {
    /// 读取一个谓词值；不存在时返回 `Ok(None)`
    fn load(&self, name: &str, userid: &str, botid: &str) -> Result<Option<String>>;

    /// 写入一个谓词值（upsert 语义）
    fn save(&self, name: &str, value: &str, userid: &str, botid: &str) -> Result<()>;

    /// 校验用户口令；无认证概念的后端恒真
    fn check_user(&self, userid: &str, password: &str, botid: &str) -> Result<bool>;

    /// 创建用户；重复的 userid 是受检错误
    fn create_user(&self, userid: &str, password: &str, botid: &str) -> Result<()>;

    /// 修改口令
    fn change_password(&self, userid: &str, password: &str, botid: &str) -> Result<()>;

    /// 已知用户数
    fn user_count(&self, botid: &str) -> Result<usize>;
}
