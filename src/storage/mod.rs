//! 存储层模块
//!
//! 提供谓词的持久化后端，支持 flat-file、SQLite 与内存实现。

pub mod factory;
pub mod flat_file;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use factory::create_predicate_store;
pub use flat_file::FlatFilePredicateStore;
pub use memory::InMemoryPredicateStore;
pub use sqlite::SqlitePredicateStore;
pub use store::PredicateStore;
