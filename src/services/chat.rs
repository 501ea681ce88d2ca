//! Response Pipeline
//!
//! Orchestrates one conversational turn: apply the bot's input
//! substitutions, split into sentences, derive the (that, topic) match
//! context from the predicate cache, match against the category store,
//! evaluate the matched template, and maintain the input/reply history
//! stacks. Symbolic reduction re-enters this pipeline through
//! `get_internal_response`.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::bot::{Bot, Bots, SubstitutionKind};
use crate::models::category::MatchResult;
use crate::observability::EngineMetrics;
use crate::services::graph::Graphmaster;
use crate::services::graph::loader::AimlLoader;
use crate::services::interpreter::{EvalContext, TemplateInterpreter};
use crate::services::normalizer::{
    apply_substitutions, normalize_whitespace, pattern_fit, sentence_split,
};
use crate::services::predicates::PredicateCache;

/// The `that` history predicate.
const THAT: &str = "that";

/// The `topic` predicate.
const TOPIC: &str = "topic";

/// The `input` history predicate.
const INPUT: &str = "input";

/// The response pipeline.
pub struct ChatService {
    graph: Arc<RwLock<Graphmaster>>,
    predicates: Arc<PredicateCache>,
    bots: Arc<Bots>,
    interpreter: TemplateInterpreter,
    metrics: Arc<EngineMetrics>,
    response_timeout: Duration,
    empty_default: String,
    log_chat: bool,
}

impl ChatService {
    /// Wires the pipeline over its collaborators.
    pub fn new(
        config: &EngineConfig,
        graph: Arc<RwLock<Graphmaster>>,
        predicates: Arc<PredicateCache>,
        bots: Arc<Bots>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            graph,
            predicates,
            bots,
            interpreter: TemplateInterpreter::new(&config.interpreter),
            metrics,
            response_timeout: Duration::from_millis(config.matching.response_timeout_ms),
            empty_default: config.predicates.empty_default.clone(),
            log_chat: config.logging.log_chat,
        }
    }

    /// The predicate cache.
    pub fn predicates(&self) -> &PredicateCache {
        &self.predicates
    }

    /// The bot registry.
    pub fn bots(&self) -> &Bots {
        &self.bots
    }

    /// The category store.
    pub fn graph(&self) -> &RwLock<Graphmaster> {
        &self.graph
    }

    /// Number of categories currently loaded.
    pub fn category_count(&self) -> usize {
        self.graph.read().category_count()
    }

    /// Returns the reply to a user input.
    ///
    /// The reply may be empty (no category matched); that is a
    /// recoverable outcome, not a failure. Errors are reserved for an
    /// unknown bot and for internal invariant violations during
    /// evaluation.
    pub fn get_response(&self, input: &str, userid: &str, botid: &str) -> Result<String> {
        let bot = self
            .bots
            .get(botid)
            .ok_or_else(|| EngineError::NotFound(format!("bot {}", botid)))?;

        let started = Instant::now();
        let deadline = started + self.response_timeout;

        let substituted =
            apply_substitutions(bot.substitutions(SubstitutionKind::Input), input);
        let sentences = sentence_split(bot.sentence_splitters(), &substituted);

        let mut replies = Vec::with_capacity(sentences.len());
        for sentence in &sentences {
            // Push the raw sentence onto the input history before
            // matching, so <input index="1"/> refers to it.
            self.predicates.push(INPUT, sentence, userid, botid);
            replies.push(self.reply_to_sentence(sentence, userid, botid, &bot, deadline)?);
        }

        let response = normalize_whitespace(&replies.join(" "));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.metrics.record_response(elapsed_ms);
        self.metrics
            .set_predicates_cached(self.predicates.cached_value_count());
        if self.log_chat {
            info!(
                target: "chat",
                %userid,
                %botid,
                input = %input,
                reply = %response,
                elapsed_ms,
                avg_ms = self.metrics.average_response_time_ms(),
                "exchange"
            );
        }
        Ok(response)
    }

    /// Produces a response to an "internal" input, one generated by a
    /// `srai` mid-template. Reuses the caller's reduction context (loop
    /// guard, depth, deadline) but matches with a fresh star context,
    /// and does not touch the input history.
    pub fn get_internal_response(&self, input: &str, ctx: &mut EvalContext) -> Result<String> {
        self.metrics.record_srai();
        let userid = ctx.userid.clone();
        let botid = ctx.botid.clone();
        let Some(bot) = self.bots.get(&botid) else {
            return Err(EngineError::NotFound(format!("bot {}", botid)));
        };

        let (that, topic) = self.match_context(&userid, &botid, &bot);
        let normalized = pattern_fit(input);
        let result = {
            let graph = self.graph.read();
            graph.match_path(&normalized, &that, &topic, &botid, ctx.deadline)
        };
        let Some(matched) = result else {
            debug!(%input, %botid, "no category matched reduction input");
            self.metrics.record_no_match();
            return Ok(String::new());
        };

        let mut child = EvalContext {
            chat: ctx.chat,
            userid,
            botid,
            pattern_stars: matched.pattern_stars.clone(),
            that_stars: matched.that_stars.clone(),
            topic_stars: matched.topic_stars.clone(),
            inputs: std::mem::take(&mut ctx.inputs),
            depth: ctx.depth,
            deadline: ctx.deadline,
        };
        let reply = self.evaluate_matched(&matched, &mut child);
        ctx.inputs = child.inputs;
        reply
    }

    /// One sentence through match-and-evaluate, with history upkeep.
    fn reply_to_sentence(
        &self,
        sentence: &str,
        userid: &str,
        botid: &str,
        bot: &Bot,
        deadline: Instant,
    ) -> Result<String> {
        let (that, topic) = self.match_context(userid, botid, bot);
        let normalized = pattern_fit(sentence);

        let result = {
            let graph = self.graph.read();
            graph.match_path(&normalized, &that, &topic, botid, deadline)
        };

        let reply = match result {
            Some(matched) => {
                debug!(path = %matched.path, source = %matched.source, "match");
                let mut ctx = EvalContext::new(self, userid, botid, deadline);
                ctx.pattern_stars = matched.pattern_stars.clone();
                ctx.that_stars = matched.that_stars.clone();
                ctx.topic_stars = matched.topic_stars.clone();
                ctx.inputs.push(normalized);
                self.evaluate_matched(&matched, &mut ctx)?
            }
            None => {
                info!(target: "chat", %sentence, %botid, "no match");
                self.metrics.record_no_match();
                String::new()
            }
        };

        // Push the reply onto the reply history so the next turn's
        // `that` context sees it.
        self.predicates.push(THAT, &reply, userid, botid);
        Ok(normalize_whitespace(&reply))
    }

    /// Evaluates a matched template; element-level failures have
    /// already degraded inside the interpreter, so an error here is an
    /// internal invariant violation that aborts the response.
    fn evaluate_matched(&self, matched: &MatchResult, ctx: &mut EvalContext) -> Result<String> {
        match self.interpreter.evaluate_template(&matched.template, ctx) {
            Ok(reply) => Ok(reply),
            Err(EngineError::Internal(message)) => {
                self.metrics.record_error();
                Err(EngineError::Internal(message))
            }
            Err(error) => {
                self.metrics.record_error();
                warn!(%error, path = %matched.path, "template evaluation degraded to empty reply");
                Ok(String::new())
            }
        }
    }

    /// Derives the (that, topic) match context from the history
    /// predicates: the last sentence of the previous reply and the topic
    /// predicate, pattern-fit, with `*` standing in for empty/default.
    fn match_context(&self, userid: &str, botid: &str, bot: &Bot) -> (String, String) {
        let previous_reply = self.predicates.get_indexed(THAT, 1, userid, botid);
        let that_sentences = sentence_split(bot.sentence_splitters(), &previous_reply);
        let that = pattern_fit(that_sentences.last().map(String::as_str).unwrap_or(""));
        let that = if that.is_empty() || that == self.empty_default {
            "*".to_string()
        } else {
            that
        };

        let topic = pattern_fit(&self.predicates.get(TOPIC, userid, botid));
        let topic = if topic.is_empty() || topic == self.empty_default {
            "*".to_string()
        } else {
            topic
        };

        (that, topic)
    }

    /// Loads a rule file into the category store for a bot at runtime
    /// (the `learn` tag and reload flows). Parsing happens outside the
    /// write lock; only the insert holds it.
    pub fn learn(&self, path: &str, botid: &str) -> Result<usize> {
        if self.bots.get(botid).is_none() {
            return Err(EngineError::NotFound(format!("bot {}", botid)));
        }
        let categories = AimlLoader::load_file(Path::new(path))?;
        let count = {
            let mut graph = self.graph.write();
            graph.add_categories(botid, &categories)
        };
        self.metrics.set_categories_loaded(self.category_count());
        Ok(count)
    }

    /// Flushes all cached predicates to the backend (shutdown path).
    pub fn save_all(&self) {
        self.predicates.save_all();
    }
}

/// 创建响应管线
pub fn create_chat_service(
    config: &EngineConfig,
    graph: Arc<RwLock<Graphmaster>>,
    predicates: Arc<PredicateCache>,
    bots: Arc<Bots>,
    metrics: Arc<EngineMetrics>,
) -> Arc<ChatService> {
    Arc::new(ChatService::new(config, graph, predicates, bots, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config::{BotConfig, PredicateInfoConfig, RandomStrategy};
    use crate::services::predicates::create_predicate_cache;
    use crate::storage::memory::InMemoryPredicateStore;

    const RULES: &str = r#"<aiml>
  <category>
    <pattern>HELLO</pattern>
    <template>Hi there!</template>
  </category>
  <category>
    <pattern>HI</pattern>
    <template><srai>HELLO</srai></template>
  </category>
  <category>
    <pattern>HOWDY</pattern>
    <template><srai>HI</srai></template>
  </category>
  <category>
    <pattern>MY NAME IS *</pattern>
    <template>Nice to meet you, <star/>.</template>
  </category>
  <category>
    <pattern>REMEMBER MY NAME IS *</pattern>
    <template><think><set name="name"><star/></set></think>Noted.</template>
  </category>
  <category>
    <pattern>WHO AM I</pattern>
    <template>You are <get name="name"/>.</template>
  </category>
  <category>
    <pattern>DO YOU LIKE CATS</pattern>
    <template>Do you like cats?</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <that>DO YOU LIKE CATS</that>
    <template>Me too!</template>
  </category>
  <category>
    <pattern>YES</pattern>
    <template>I see.</template>
  </category>
  <category>
    <pattern>LOOP</pattern>
    <template><srai>LOOP</srai></template>
  </category>
  <category>
    <pattern>INFINITE LOOP</pattern>
    <template>Let us talk about something else.</template>
  </category>
  <category>
    <pattern>PICK ONE</pattern>
    <template><random><li>alpha</li><li>beta</li><li>gamma</li></random></template>
  </category>
  <category>
    <pattern>AM I HAPPY</pattern>
    <template><condition name="mood" value="happy">You are glowing.</condition></template>
  </category>
  <category>
    <pattern>HOW DO I FEEL</pattern>
    <template><condition name="mood"><li value="happy">Great!</li><li value="* sad">Oh no.</li><li>No idea.</li></condition></template>
  </category>
  <category>
    <pattern>SHOUT *</pattern>
    <template><uppercase><star/></uppercase></template>
  </category>
  <category>
    <pattern>FLIP *</pattern>
    <template><person><star/></person></template>
  </category>
  <category>
    <pattern>WHAT DID I SAY</pattern>
    <template>You said: <input index="2"/></template>
  </category>
</aiml>"#;

    fn engine() -> Arc<ChatService> {
        let mut config = EngineConfig::development();
        config.bots = vec![BotConfig {
            id: "demo".into(),
            predicates: vec![PredicateInfoConfig {
                name: "name".into(),
                default: "friend".into(),
                return_name_when_set: false,
            }],
            substitutions: crate::config::config::SubstitutionsConfig {
                input: vec![("i'm".into(), "I am".into())],
                person: vec![
                    ("you are".into(), "I am".into()),
                    ("I am".into(), "you are".into()),
                ],
                ..Default::default()
            },
            ..Default::default()
        }];
        config.interpreter.random_strategy = RandomStrategy::PureRandom;

        let bots = Arc::new(Bots::from_configs(&config.bots));
        let mut graph = Graphmaster::new(&config.matching);
        let categories = AimlLoader::parse_str(RULES, "test.aiml").unwrap();
        graph.add_categories("demo", &categories);

        let store = Arc::new(InMemoryPredicateStore::new());
        let predicates = create_predicate_cache(&config.predicates, store, bots.clone());
        let metrics = Arc::new(EngineMetrics::default());
        create_chat_service(
            &config,
            Arc::new(RwLock::new(graph)),
            predicates,
            bots,
            metrics,
        )
    }

    #[test]
    fn test_direct_reply() {
        let chat = engine();
        assert_eq!(chat.get_response("Hello", "alice", "demo").unwrap(), "Hi there!");
    }

    #[test]
    fn test_unknown_bot_is_error() {
        let chat = engine();
        assert!(matches!(
            chat.get_response("Hello", "alice", "ghost"),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn test_no_match_yields_empty_reply() {
        let chat = engine();
        assert_eq!(chat.get_response("xyzzy plugh", "alice", "demo").unwrap(), "");
    }

    #[test]
    fn test_srai_equivalence() {
        let chat = engine();
        let direct = chat.get_response("HELLO", "alice", "demo").unwrap();
        let once = chat.get_response("HI", "alice", "demo").unwrap();
        let twice = chat.get_response("HOWDY", "alice", "demo").unwrap();
        assert_eq!(direct, "Hi there!");
        assert_eq!(once, direct);
        assert_eq!(twice, direct);
    }

    #[test]
    fn test_wildcard_capture_in_reply() {
        let chat = engine();
        assert_eq!(
            chat.get_response("MY NAME IS ADA", "alice", "demo").unwrap(),
            "Nice to meet you, ADA."
        );
    }

    #[test]
    fn test_think_set_then_get() {
        let chat = engine();
        assert_eq!(
            chat.get_response("REMEMBER MY NAME IS ADA", "alice", "demo").unwrap(),
            "Noted."
        );
        assert_eq!(
            chat.get_response("WHO AM I", "alice", "demo").unwrap(),
            "You are ADA."
        );
        // The predicate is scoped per user.
        assert_eq!(
            chat.get_response("WHO AM I", "bob", "demo").unwrap(),
            "You are friend."
        );
    }

    #[test]
    fn test_that_context_selects_specific_category() {
        let chat = engine();
        chat.get_response("DO YOU LIKE CATS", "alice", "demo").unwrap();
        assert_eq!(chat.get_response("YES", "alice", "demo").unwrap(), "Me too!");
        // Without the priming reply, the generic category answers.
        assert_eq!(chat.get_response("YES", "bob", "demo").unwrap(), "I see.");
    }

    #[test]
    fn test_runaway_srai_is_bounded() {
        let chat = engine();
        // LOOP reduces to itself; the sentinel redirects it once, and the
        // sentinel category answers.
        let reply = chat.get_response("LOOP", "alice", "demo").unwrap();
        assert_eq!(reply, "Let us talk about something else.");
    }

    #[test]
    fn test_random_replies_stay_in_choice_set() {
        let chat = engine();
        for _ in 0..20 {
            let reply = chat.get_response("PICK ONE", "alice", "demo").unwrap();
            assert!(["alpha", "beta", "gamma"].contains(&reply.as_str()), "got {}", reply);
        }
    }

    #[test]
    fn test_block_condition() {
        let chat = engine();
        assert_eq!(chat.get_response("AM I HAPPY", "alice", "demo").unwrap(), "");
        chat.predicates().set("mood", "happy", "alice", "demo");
        assert_eq!(
            chat.get_response("AM I HAPPY", "alice", "demo").unwrap(),
            "You are glowing."
        );
    }

    #[test]
    fn test_single_predicate_condition_with_pattern_values() {
        let chat = engine();
        chat.predicates().set("mood", "very sad", "alice", "demo");
        assert_eq!(
            chat.get_response("HOW DO I FEEL", "alice", "demo").unwrap(),
            "Oh no."
        );
        chat.predicates().set("mood", "confused", "alice", "demo");
        assert_eq!(
            chat.get_response("HOW DO I FEEL", "alice", "demo").unwrap(),
            "No idea."
        );
    }

    #[test]
    fn test_case_and_person_tags() {
        let chat = engine();
        assert_eq!(
            chat.get_response("SHOUT make it loud", "alice", "demo").unwrap(),
            "MAKE IT LOUD"
        );
        assert_eq!(
            chat.get_response("FLIP you are late", "alice", "demo").unwrap(),
            "I am late"
        );
    }

    #[test]
    fn test_input_substitutions_applied() {
        let chat = engine();
        // "i'm" becomes "I am" before matching, so this hits FLIP's
        // pattern with the substituted text.
        let reply = chat.get_response("FLIP i'm ready", "alice", "demo").unwrap();
        assert_eq!(reply, "you are ready");
    }

    #[test]
    fn test_input_history_lookup() {
        let chat = engine();
        chat.get_response("HELLO", "alice", "demo").unwrap();
        assert_eq!(
            chat.get_response("WHAT DID I SAY", "alice", "demo").unwrap(),
            "You said: HELLO"
        );
    }

    #[test]
    fn test_learn_missing_bot_is_error() {
        let chat = engine();
        assert!(chat.learn("nowhere.aiml", "ghost").is_err());
    }
}
