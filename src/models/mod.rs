//! 核心数据模型模块
//!
//! 定义 Colloquy 的核心数据结构：Category, Match, Template AST,
//! PredicateValue/PredicateMap 以及 Bot。

pub mod bot;
pub mod category;
pub mod predicate;
pub mod template;

pub use bot::*;
pub use category::*;
pub use predicate::*;
pub use template::*;
