//! 服务模块

pub mod chat;
pub mod graph;
pub mod interpreter;
pub mod normalizer;
pub mod predicates;

pub use chat::{ChatService, create_chat_service};
pub use graph::{Graphmaster, loader::AimlLoader, pattern::matches_pattern};
pub use interpreter::{EvalContext, TemplateInterpreter};
pub use predicates::{PredicateCache, create_predicate_cache};
