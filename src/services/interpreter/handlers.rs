//! Tag Handlers
//!
//! The standard tag set, registered by name into the interpreter's
//! registry at startup. Handler state (the per-scope random generators)
//! lives inside the closures, not in process-wide statics.

use std::collections::{HashMap, VecDeque, hash_map::DefaultHasher};
use std::hash::{Hash, Hasher};
use std::time::Instant;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::config::{InterpreterConfig, RandomStrategy};
use crate::error::{EngineError, Result};
use crate::models::bot::SubstitutionKind;
use crate::models::template::Element;
use crate::services::graph::pattern::matches_pattern;
use crate::services::interpreter::{EvalContext, Handler, TemplateInterpreter};
use crate::services::normalizer::sentence_split;

/// Entries kept in the per-scope random generator cache.
const GENERATOR_CACHE_SIZE: usize = 100;

/// Builds the standard registry.
pub fn build_registry(config: &InterpreterConfig) -> HashMap<String, Handler> {
    let mut registry: HashMap<String, Handler> = HashMap::new();

    // --- symbolic reduction ---
    let max_depth = config.max_depth;
    let sentinel = config.infinite_loop_input.clone();
    registry.insert(
        "srai".into(),
        Box::new(move |element, interp, ctx| {
            let target = interp.evaluate_nodes(&element.children, ctx)?;
            reduce(target, max_depth, &sentinel, ctx)
        }),
    );

    let max_depth = config.max_depth;
    let sentinel = config.infinite_loop_input.clone();
    registry.insert(
        "sr".into(),
        Box::new(move |_element, _interp, ctx| {
            let target = ctx.pattern_stars.first().cloned().unwrap_or_default();
            reduce(target, max_depth, &sentinel, ctx)
        }),
    );

    // --- indexed retrieval ---
    registry.insert(
        "star".into(),
        Box::new(|element, _interp, ctx| Ok(indexed_star(&ctx.pattern_stars, element))),
    );
    registry.insert(
        "thatstar".into(),
        Box::new(|element, _interp, ctx| Ok(indexed_star(&ctx.that_stars, element))),
    );
    registry.insert(
        "topicstar".into(),
        Box::new(|element, _interp, ctx| Ok(indexed_star(&ctx.topic_stars, element))),
    );
    registry.insert(
        "input".into(),
        Box::new(|element, _interp, ctx| Ok(history_lookup("input", element, ctx))),
    );
    registry.insert(
        "that".into(),
        Box::new(|element, _interp, ctx| Ok(history_lookup("that", element, ctx))),
    );

    // --- predicates ---
    registry.insert(
        "get".into(),
        Box::new(|element, _interp, ctx| {
            let name = required_attribute(element, "name")?;
            Ok(ctx.chat.predicates().get(name, &ctx.userid, &ctx.botid))
        }),
    );
    registry.insert(
        "set".into(),
        Box::new(|element, interp, ctx| {
            let name = required_attribute(element, "name")?.to_string();
            let value = interp.evaluate_nodes(&element.children, ctx)?;
            Ok(ctx.chat.predicates().set(&name, &value, &ctx.userid, &ctx.botid))
        }),
    );
    registry.insert(
        "think".into(),
        Box::new(|element, interp, ctx| {
            interp.evaluate_nodes(&element.children, ctx)?;
            Ok(String::new())
        }),
    );

    // --- random choice ---
    let random_state = Arc::new(Mutex::new(RandomState::new()));
    let strategy = config.random_strategy;
    registry.insert(
        "random".into(),
        Box::new(move |element, interp, ctx| {
            let listitems: Vec<&Element> =
                element.child_elements().filter(|e| e.name == "li").collect();
            if listitems.is_empty() {
                return interp.evaluate_nodes(&element.children, ctx);
            }
            if listitems.len() == 1 {
                return interp.evaluate_nodes(&listitems[0].children, ctx);
            }
            let key = format!("{}:{}:{}", ctx.botid, ctx.userid, element.identity());
            // Choose under the lock, evaluate outside it: list items may
            // contain further random elements.
            let choice = random_state.lock().choose(&key, listitems.len(), strategy);
            interp.evaluate_nodes(&listitems[choice].children, ctx)
        }),
    );

    // --- condition ---
    registry.insert("condition".into(), Box::new(condition));

    // --- substitution and case families ---
    registry.insert("person".into(), substitution_handler(SubstitutionKind::Person));
    registry.insert("person2".into(), substitution_handler(SubstitutionKind::Person2));
    registry.insert("gender".into(), substitution_handler(SubstitutionKind::Gender));
    registry.insert(
        "formal".into(),
        Box::new(|element, interp, ctx| {
            let content = shorthand_content(element, interp, ctx)?;
            Ok(content.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" "))
        }),
    );
    registry.insert(
        "sentence".into(),
        Box::new(|element, interp, ctx| {
            let content = shorthand_content(element, interp, ctx)?;
            let trimmed = content.trim_start();
            Ok(capitalize(trimmed))
        }),
    );
    registry.insert(
        "uppercase".into(),
        Box::new(|element, interp, ctx| {
            Ok(shorthand_content(element, interp, ctx)?.to_uppercase())
        }),
    );
    registry.insert(
        "lowercase".into(),
        Box::new(|element, interp, ctx| {
            Ok(shorthand_content(element, interp, ctx)?.to_lowercase())
        }),
    );

    // --- environment lookups ---
    registry.insert(
        "bot".into(),
        Box::new(|element, _interp, ctx| {
            let name = required_attribute(element, "name")?;
            Ok(ctx
                .chat
                .bots()
                .get(&ctx.botid)
                .and_then(|bot| bot.property(name).map(str::to_string))
                .unwrap_or_default())
        }),
    );
    registry.insert(
        "date".into(),
        Box::new(|_element, _interp, _ctx| {
            Ok(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
        }),
    );
    registry.insert(
        "id".into(),
        Box::new(|_element, _interp, ctx| Ok(ctx.userid.clone())),
    );
    registry.insert(
        "size".into(),
        Box::new(|_element, _interp, ctx| Ok(ctx.chat.category_count().to_string())),
    );
    registry.insert(
        "version".into(),
        Box::new(|_element, _interp, _ctx| Ok(env!("CARGO_PKG_VERSION").to_string())),
    );
    registry.insert(
        "gossip".into(),
        Box::new(|element, interp, ctx| {
            let content = interp.evaluate_nodes(&element.children, ctx)?;
            info!(target: "gossip", botid = %ctx.botid, userid = %ctx.userid, %content);
            Ok(String::new())
        }),
    );

    // --- runtime learning ---
    registry.insert(
        "learn".into(),
        Box::new(|element, interp, ctx| {
            let path = interp.evaluate_nodes(&element.children, ctx)?;
            let path = path.trim();
            if path.is_empty() {
                return Err(EngineError::Evaluation("learn requires a file path".into()));
            }
            let count = ctx
                .chat
                .learn(path, &ctx.botid)
                .map_err(|e| EngineError::Evaluation(e.to_string()))?;
            info!(%path, botid = %ctx.botid, categories = count, "learned rule file");
            Ok(String::new())
        }),
    );

    // --- shell-out ---
    let allow_os_access = config.allow_os_access;
    let system_directory = config.system_directory.clone();
    let system_prefix = config.system_prefix.clone();
    registry.insert(
        "system".into(),
        Box::new(move |element, interp, ctx| {
            if !allow_os_access {
                warn!("use of <system> prohibited by configuration");
                return Ok(String::new());
            }
            let mut command_line = interp.evaluate_nodes(&element.children, ctx)?;
            if let Some(prefix) = &system_prefix {
                command_line = format!("{} {}", prefix, command_line);
            }
            let command_line = command_line.trim().to_string();
            let mut parts = command_line.split_whitespace();
            let Some(program) = parts.next() else {
                return Ok(String::new());
            };
            let output = std::process::Command::new(program)
                .args(parts)
                .current_dir(&system_directory)
                .output()
                .map_err(|e| {
                    EngineError::Evaluation(format!("system command \"{}\": {}", command_line, e))
                })?;
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }),
    );
    registry.insert(
        "javascript".into(),
        Box::new(|_element, _interp, _ctx| {
            warn!("<javascript> is not supported; no interpreter is configured");
            Ok(String::new())
        }),
    );

    // --- containers evaluated transparently ---
    registry.insert(
        "template".into(),
        Box::new(|element, interp, ctx| interp.evaluate_nodes(&element.children, ctx)),
    );
    registry.insert(
        "li".into(),
        Box::new(|element, interp, ctx| interp.evaluate_nodes(&element.children, ctx)),
    );

    registry
}

/// Symbolic reduction: feed the target back through the whole
/// match-and-evaluate pipeline, guarding against runaway loops.
fn reduce(
    target: String,
    max_depth: usize,
    sentinel: &str,
    ctx: &mut EvalContext,
) -> Result<String> {
    if ctx.depth >= max_depth {
        return Err(EngineError::Evaluation(format!(
            "srai recursion exceeded depth limit {}",
            max_depth
        )));
    }
    if Instant::now() >= ctx.deadline {
        return Err(EngineError::Evaluation("response deadline reached in srai".into()));
    }

    let mut target = target;
    if ctx.inputs.iter().any(|seen| seen.eq_ignore_ascii_case(&target)) {
        if target.eq_ignore_ascii_case(sentinel) {
            warn!("infinite loop detected; cannot substitute the loop input");
            return Ok(String::new());
        }
        warn!(%target, "infinite loop detected; substituting the configured loop input");
        target = sentinel.to_string();
    }
    ctx.inputs.push(target.clone());

    ctx.depth += 1;
    let chat = ctx.chat;
    let result = chat.get_internal_response(&target, ctx);
    ctx.depth -= 1;
    result
}

/// The three syntactic condition forms.
fn condition(element: &Element, interp: &TemplateInterpreter, ctx: &mut EvalContext) -> Result<String> {
    let name = element.attribute("name").unwrap_or("").to_string();
    let value = element.attribute("value").unwrap_or("").to_string();

    // Block form: name and value on the element itself; the whole body
    // runs if the named predicate fits the value.
    if !name.is_empty() && !value.is_empty() {
        let predicate = ctx.chat.predicates().get(&name, &ctx.userid, &ctx.botid);
        return match matches_pattern(&predicate, &value) {
            Ok(true) => interp.evaluate_nodes(&element.children, ctx),
            Ok(false) => Ok(String::new()),
            Err(e) => {
                warn!(%e, "condition value attribute is not a pattern; treating as non-matching");
                Ok(String::new())
            }
        };
    }

    // Single-predicate form: name on the element, value-only list items.
    if !name.is_empty() {
        let predicate = ctx.chat.predicates().get(&name, &ctx.userid, &ctx.botid);
        for li in element.child_elements().filter(|e| e.name == "li") {
            match li.attribute("value") {
                Some(li_value) => match matches_pattern(&predicate, li_value) {
                    Ok(true) => return interp.evaluate_nodes(&li.children, ctx),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(%e, "condition value attribute is not a pattern; skipping item");
                    }
                },
                // An unattributed item is the default.
                None => return interp.evaluate_nodes(&li.children, ctx),
            }
        }
        return Ok(String::new());
    }

    // Multi-predicate form: each list item carries its own name+value.
    for li in element.child_elements().filter(|e| e.name == "li") {
        match (li.attribute("name"), li.attribute("value")) {
            (Some(li_name), Some(li_value)) => {
                let predicate = ctx.chat.predicates().get(li_name, &ctx.userid, &ctx.botid);
                match matches_pattern(&predicate, li_value) {
                    Ok(true) => return interp.evaluate_nodes(&li.children, ctx),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(%e, "condition value attribute is not a pattern; skipping item");
                    }
                }
            }
            (None, None) => return interp.evaluate_nodes(&li.children, ctx),
            // An item with only one of the two attributes is ignored.
            _ => {}
        }
    }
    Ok(String::new())
}

fn substitution_handler(kind: SubstitutionKind) -> Handler {
    Box::new(move |element, interp, ctx| {
        let content = shorthand_content(element, interp, ctx)?;
        let Some(bot) = ctx.chat.bots().get(&ctx.botid) else {
            return Ok(content);
        };
        Ok(crate::services::normalizer::apply_substitutions(
            bot.substitutions(kind),
            &content,
        ))
    })
}

/// A childless substitution/case element is shorthand for applying the
/// operation to the most recent top-level wildcard capture.
fn shorthand_content(
    element: &Element,
    interp: &TemplateInterpreter,
    ctx: &mut EvalContext,
) -> Result<String> {
    if element.children.is_empty() {
        return Ok(ctx.pattern_stars.first().cloned().unwrap_or_default());
    }
    interp.evaluate_nodes(&element.children, ctx)
}

fn required_attribute<'e>(element: &'e Element, name: &str) -> Result<&'e str> {
    element
        .attribute(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            EngineError::Evaluation(format!(
                "<{}> requires a non-empty \"{}\" attribute",
                element.name, name
            ))
        })
}

/// 1-based star list retrieval; out of range yields the empty string.
fn indexed_star(stars: &[String], element: &Element) -> String {
    let (index, _) = parse_index(element.attribute("index"));
    stars.get(index.wrapping_sub(1)).cloned().unwrap_or_default()
}

/// 1-D or 2-D lookup into a history predicate. The first dimension
/// selects the history entry, the second a sentence within it, counted
/// from the most recent.
fn history_lookup(name: &str, element: &Element, ctx: &mut EvalContext) -> String {
    let (entry, sentence) = parse_index(element.attribute("index"));
    let value = ctx
        .chat
        .predicates()
        .get_indexed(name, entry, &ctx.userid, &ctx.botid);
    let Some(sentence_index) = sentence else {
        return value;
    };
    let splitters = ctx
        .chat
        .bots()
        .get(&ctx.botid)
        .map(|bot| bot.sentence_splitters().to_vec())
        .unwrap_or_default();
    let sentences = sentence_split(&splitters, &value);
    sentences
        .iter()
        .rev()
        .nth(sentence_index.wrapping_sub(1))
        .cloned()
        .unwrap_or_default()
}

/// Parses a "n" or "n,m" index attribute; malformed parts fall back
/// to 1.
fn parse_index(attr: Option<&str>) -> (usize, Option<usize>) {
    let Some(attr) = attr else {
        return (1, None);
    };
    let mut parts = attr.splitn(2, ',');
    let first = parts
        .next()
        .and_then(|p| p.trim().parse::<usize>().ok())
        .unwrap_or(1);
    let second = parts.next().and_then(|p| p.trim().parse::<usize>().ok());
    (first, second)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Per-scope random generators in a bounded LRU, plus the shuffled bags
/// used by the non-repeating strategy. One generator per
/// (botid, userid, element identity) keeps repeated activations of the
/// same rule on one continuing sequence while different scopes stay
/// independent.
struct RandomState {
    generators: HashMap<String, ChaCha8Rng>,
    order: VecDeque<String>,
    bags: HashMap<String, Vec<usize>>,
    seed: u64,
}

impl RandomState {
    fn new() -> Self {
        Self {
            generators: HashMap::new(),
            order: VecDeque::new(),
            bags: HashMap::new(),
            seed: rand::random(),
        }
    }

    fn choose(&mut self, key: &str, count: usize, strategy: RandomStrategy) -> usize {
        self.touch(key);
        match strategy {
            RandomStrategy::PureRandom => {
                let generator = self.generators.get_mut(key).expect("generator just touched");
                generator.gen_range(0..count)
            }
            RandomStrategy::NonRepeating => self.choose_non_repeating(key, count),
        }
    }

    /// Shuffled bag: no list item repeats until all others have been
    /// chosen, and a refilled bag never starts with the previous choice.
    fn choose_non_repeating(&mut self, key: &str, count: usize) -> usize {
        let generator = self.generators.get_mut(key).expect("generator just touched");
        let bag = self
            .bags
            .entry(key.to_string())
            .or_insert_with(|| (0..count).collect());
        if bag.is_empty() || bag.iter().any(|&i| i >= count) {
            // The element changed arity (e.g. a COMBINE added an
            // alternative); start over.
            *bag = (0..count).collect();
        }

        let position = if bag.len() == count && count > 1 {
            generator.gen_range(0..bag.len() - 1)
        } else {
            generator.gen_range(0..bag.len())
        };
        let choice = bag.remove(position);

        if bag.is_empty() {
            *bag = (0..count).filter(|&i| i != choice).collect();
            bag.push(choice);
        }
        choice
    }

    /// Marks a key most-recently-used, creating its generator if needed
    /// and evicting the least-recently-used entry beyond capacity.
    fn touch(&mut self, key: &str) {
        if self.generators.contains_key(key) {
            self.order.retain(|k| k != key);
            self.order.push_back(key.to_string());
            return;
        }
        while self.order.len() >= GENERATOR_CACHE_SIZE {
            if let Some(evicted) = self.order.pop_front() {
                self.generators.remove(&evicted);
                self.bags.remove(&evicted);
            }
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.generators.insert(
            key.to_string(),
            ChaCha8Rng::seed_from_u64(self.seed ^ hasher.finish()),
        );
        self.order.push_back(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_forms() {
        assert_eq!(parse_index(None), (1, None));
        assert_eq!(parse_index(Some("2")), (2, None));
        assert_eq!(parse_index(Some("1,2")), (1, Some(2)));
        assert_eq!(parse_index(Some("bogus")), (1, None));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("ada"), "Ada");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
    }

    #[test]
    fn test_random_state_same_key_continues_one_sequence() {
        let mut state = RandomState::new();
        let first: Vec<usize> = (0..20)
            .map(|_| state.choose("bot:alice:42", 5, RandomStrategy::PureRandom))
            .collect();
        assert!(first.iter().all(|&c| c < 5));
        // Different scope draws independently but stays in range.
        let other: Vec<usize> = (0..20)
            .map(|_| state.choose("bot:bob:42", 5, RandomStrategy::PureRandom))
            .collect();
        assert!(other.iter().all(|&c| c < 5));
    }

    #[test]
    fn test_non_repeating_cycles_through_all_choices() {
        let mut state = RandomState::new();
        let mut seen: Vec<usize> = (0..4)
            .map(|_| state.choose("k", 4, RandomStrategy::NonRepeating))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_non_repeating_never_repeats_immediately() {
        let mut state = RandomState::new();
        let mut last = state.choose("k", 3, RandomStrategy::NonRepeating);
        for _ in 0..50 {
            let next = state.choose("k", 3, RandomStrategy::NonRepeating);
            assert_ne!(next, last);
            last = next;
        }
    }

    #[test]
    fn test_generator_cache_bounded() {
        let mut state = RandomState::new();
        for i in 0..(GENERATOR_CACHE_SIZE + 20) {
            state.choose(&format!("key-{}", i), 3, RandomStrategy::PureRandom);
        }
        assert!(state.generators.len() <= GENERATOR_CACHE_SIZE);
        assert_eq!(state.generators.len(), state.order.len());
    }
}
