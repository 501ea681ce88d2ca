//! Template Interpreter
//!
//! A tag-dispatch tree-walking interpreter. Tag names map to handler
//! closures through a registry built once at startup; new tags register
//! without touching dispatch code. Handlers receive the element, the
//! interpreter (for sub-evaluation) and the mutable evaluation context.
//!
//! Failure semantics: an element-level failure is caught here, logged,
//! and degrades to the empty string; only internal invariant violations
//! abort the enclosing response.

pub mod handlers;

use std::collections::HashMap;
use std::time::Instant;

use tracing::warn;

use crate::config::config::InterpreterConfig;
use crate::error::{EngineError, Result};
use crate::models::template::{Element, TemplateNode};
use crate::services::chat::ChatService;

/// Mutable state threaded through one template evaluation.
pub struct EvalContext<'a> {
    /// The response pipeline, for symbolic reduction re-entry.
    pub chat: &'a ChatService,
    pub userid: String,
    pub botid: String,
    /// Wildcard captures from the matched pattern segment.
    pub pattern_stars: Vec<String>,
    /// Wildcard captures from the matched that segment.
    pub that_stars: Vec<String>,
    /// Wildcard captures from the matched topic segment.
    pub topic_stars: Vec<String>,
    /// Inputs already seen along this reduction chain (loop detection).
    pub inputs: Vec<String>,
    /// Current srai recursion depth.
    pub depth: usize,
    /// Hard deadline for the whole response.
    pub deadline: Instant,
}

impl<'a> EvalContext<'a> {
    /// Creates a fresh context for one matched sentence.
    pub fn new(chat: &'a ChatService, userid: &str, botid: &str, deadline: Instant) -> Self {
        Self {
            chat,
            userid: userid.to_string(),
            botid: botid.to_string(),
            pattern_stars: Vec::new(),
            that_stars: Vec::new(),
            topic_stars: Vec::new(),
            inputs: Vec::new(),
            depth: 0,
            deadline,
        }
    }
}

/// Handler signature: element + interpreter + context in, text out.
pub type Handler = Box<
    dyn for<'a> Fn(&Element, &TemplateInterpreter, &mut EvalContext<'a>) -> Result<String>
        + Send
        + Sync,
>;

/// The tag-dispatch interpreter.
pub struct TemplateInterpreter {
    registry: HashMap<String, Handler>,
}

impl TemplateInterpreter {
    /// Builds the interpreter with the standard tag set registered.
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            registry: handlers::build_registry(config),
        }
    }

    /// Registers (or replaces) a handler for a tag name.
    pub fn register(&mut self, name: &str, handler: Handler) {
        self.registry.insert(name.to_string(), handler);
    }

    /// Whether a tag name has a registered handler.
    pub fn handles(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Evaluates a matched template. Element-level failures have already
    /// degraded to empty strings; only fatal errors surface here.
    pub fn evaluate_template(&self, template: &Element, ctx: &mut EvalContext) -> Result<String> {
        self.evaluate_nodes(&template.children, ctx)
    }

    /// Evaluates a list of nodes, concatenating text and element
    /// results.
    pub fn evaluate_nodes(&self, nodes: &[TemplateNode], ctx: &mut EvalContext) -> Result<String> {
        let mut out = String::new();
        for node in nodes {
            match node {
                TemplateNode::Text(text) => out.push_str(text),
                TemplateNode::Element(element) => out.push_str(&self.evaluate_element(element, ctx)?),
            }
        }
        Ok(out)
    }

    /// Evaluates one element through the registry.
    ///
    /// Unknown elements are reconstructed literally. Recoverable
    /// handler failures degrade to the empty string with a warning;
    /// internal invariant violations propagate and abort the response.
    pub fn evaluate_element(&self, element: &Element, ctx: &mut EvalContext) -> Result<String> {
        if Instant::now() >= ctx.deadline {
            warn!(
                tag = %element.name,
                userid = %ctx.userid,
                botid = %ctx.botid,
                "response deadline reached during evaluation"
            );
            return Ok(String::new());
        }

        let Some(handler) = self.registry.get(&element.name) else {
            return Ok(element.render());
        };

        match handler(element, self, ctx) {
            Ok(result) => Ok(result),
            Err(EngineError::Internal(message)) => Err(EngineError::Internal(message)),
            Err(error) => {
                warn!(
                    tag = %element.name,
                    userid = %ctx.userid,
                    botid = %ctx.botid,
                    %error,
                    "element evaluation failed, degrading to empty string"
                );
                Ok(String::new())
            }
        }
    }
}
