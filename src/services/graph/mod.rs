//! Graphmaster - Category Store
//!
//! The rule base is a trie over (pattern, that, topic) paths. Each node
//! maps branch tokens to children; branches are either literal words or
//! one of the two wildcards. The root fans out per bot; the number of
//! leaves equals the number of loaded categories, and each leaf holds the
//! category's template.
//!
//! Matching is an ordered depth-first traversal across the three
//! concatenated path segments. At every node, literal children are tried
//! before `_` before `*` (most specific first); both wildcards bind one
//! or more tokens by repeated single-token absorption, and never absorb a
//! segment separator, so the search backtracks within a segment before
//! giving up on it. Star contents are captured on the unwind and pushed
//! to the front of their segment's list, which yields left-to-right
//! order.
//!
//! Nodes live in an arena and are addressed by index. The store itself
//! is not synchronized; the engine wraps it in a read-write lock (reads
//! for match, the write lock for load/learn/unload).

pub mod loader;
pub mod pattern;

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::config::MatchingConfig;
use crate::models::category::{Category, MatchResult, MergePolicy};
use crate::models::template::{Element, TemplateNode};
use crate::services::normalizer::word_split;

/// Marker terminating the pattern segment of a path.
pub const THAT_MARKER: &str = "<THAT>";

/// Marker terminating the that segment of a path.
pub const TOPIC_MARKER: &str = "<TOPIC>";

/// Which segment of the path a traversal is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Pattern,
    That,
    Topic,
}

/// Payload stored where a full path terminates.
#[derive(Debug, Clone)]
struct Leaf {
    template: Element,
    source: String,
}

/// One trie node. Children are partitioned into a literal-token map and
/// the two wildcard slots.
#[derive(Debug)]
struct Node {
    literals: HashMap<String, usize>,
    underscore: Option<usize>,
    star: Option<usize>,
    leaf: Option<Leaf>,
    parent: Option<usize>,
    /// Minimum number of tokens needed to reach a leaf from here. Only
    /// ever decreases on insert, so it stays a safe lower bound after
    /// removals.
    height: usize,
}

impl Node {
    fn new(parent: Option<usize>) -> Self {
        Self {
            literals: HashMap::new(),
            underscore: None,
            star: None,
            leaf: None,
            parent,
            height: usize::MAX,
        }
    }

    fn is_empty(&self) -> bool {
        self.leaf.is_none()
            && self.literals.is_empty()
            && self.underscore.is_none()
            && self.star.is_none()
    }
}

/// Wildcard captures and matched path segments, accumulated during one
/// traversal.
#[derive(Debug, Default)]
struct Capture {
    pattern_stars: Vec<String>,
    that_stars: Vec<String>,
    topic_stars: Vec<String>,
    pattern_path: String,
    that_path: String,
    topic_path: String,
    expired: bool,
}

/// The category store.
pub struct Graphmaster {
    nodes: Vec<Node>,
    free: Vec<usize>,
    roots: HashMap<String, usize>,
    /// (botid, source) -> leaf node indices, for unload/reload.
    source_index: HashMap<(String, String), Vec<usize>>,
    merge_policy: MergePolicy,
    append_separator: String,
    note_each_merge: bool,
    total_categories: usize,
    duplicate_categories: usize,
}

impl Graphmaster {
    /// Creates an empty store with the given merge configuration.
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            roots: HashMap::new(),
            source_index: HashMap::new(),
            merge_policy: config.merge_policy,
            append_separator: config.merge_append_separator.clone(),
            note_each_merge: config.note_each_merge,
            total_categories: 0,
            duplicate_categories: 0,
        }
    }

    /// Number of categories presently loaded.
    pub fn category_count(&self) -> usize {
        self.total_categories
    }

    /// Number of path-identical categories seen during loading.
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_categories
    }

    /// Number of live trie nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn alloc(&mut self, parent: Option<usize>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Node::new(parent);
                idx
            }
            None => {
                self.nodes.push(Node::new(parent));
                self.nodes.len() - 1
            }
        }
    }

    fn root_for(&mut self, botid: &str) -> usize {
        if let Some(&root) = self.roots.get(botid) {
            return root;
        }
        let root = self.alloc(None);
        self.roots.insert(botid.to_string(), root);
        root
    }

    /// Composes the trie path for a category.
    fn path_tokens(pattern: &str, that: &str, topic: &str) -> Vec<String> {
        let mut tokens = word_split(pattern);
        tokens.push(THAT_MARKER.to_string());
        tokens.extend(word_split(that));
        tokens.push(TOPIC_MARKER.to_string());
        tokens.extend(word_split(topic));
        tokens
    }

    /// Adds one category for a bot, applying the merge policy when the
    /// path already terminates at an existing leaf.
    pub fn add_category(&mut self, botid: &str, category: &Category) {
        let tokens = Self::path_tokens(&category.pattern, &category.that, &category.topic);
        let mut node = self.root_for(botid);
        let total = tokens.len();

        for (depth, token) in tokens.iter().enumerate() {
            let below = total - depth;
            if self.nodes[node].height > below {
                self.nodes[node].height = below;
            }
            node = self.child_for(node, token);
        }
        if self.nodes[node].height > 0 {
            self.nodes[node].height = 0;
        }

        let key = (botid.to_string(), category.source.clone());
        if self.nodes[node].leaf.is_none() {
            self.nodes[node].leaf = Some(Leaf {
                template: category.template.clone(),
                source: category.source.clone(),
            });
            self.total_categories += 1;
        } else {
            self.duplicate_categories += 1;
            self.merge(node, category);
        }
        self.source_index.entry(key).or_default().push(node);
    }

    /// Adds a batch of categories; returns how many were processed.
    pub fn add_categories(&mut self, botid: &str, categories: &[Category]) -> usize {
        for category in categories {
            self.add_category(botid, category);
        }
        categories.len()
    }

    fn child_for(&mut self, node: usize, token: &str) -> usize {
        match token {
            "_" => {
                if let Some(child) = self.nodes[node].underscore {
                    return child;
                }
                let child = self.alloc(Some(node));
                self.nodes[node].underscore = Some(child);
                child
            }
            "*" => {
                if let Some(child) = self.nodes[node].star {
                    return child;
                }
                let child = self.alloc(Some(node));
                self.nodes[node].star = Some(child);
                child
            }
            _ => {
                let key = token.to_uppercase();
                if let Some(&child) = self.nodes[node].literals.get(&key) {
                    return child;
                }
                let child = self.alloc(Some(node));
                self.nodes[node].literals.insert(key, child);
                child
            }
        }
    }

    fn merge(&mut self, node: usize, category: &Category) {
        let leaf = self.nodes[node]
            .leaf
            .as_ref()
            .expect("merge called on a node without a leaf");
        let stored_source = leaf.source.clone();
        if self.note_each_merge {
            warn!(
                policy = ?self.merge_policy,
                new_source = %category.source,
                stored_source = %stored_source,
                pattern = %category.pattern,
                that = %category.that,
                topic = %category.topic,
                "path-identical category"
            );
        }
        match self.merge_policy {
            MergePolicy::Skip => {}
            MergePolicy::Overwrite => {
                self.nodes[node].leaf = Some(Leaf {
                    template: category.template.clone(),
                    source: category.source.clone(),
                });
            }
            MergePolicy::Append => {
                let stored = self.nodes[node].leaf.as_ref().unwrap().template.clone();
                let merged = append_templates(&stored, &category.template, &self.append_separator);
                let source = format!("{}, {}", stored_source, category.source);
                self.nodes[node].leaf = Some(Leaf {
                    template: merged,
                    source,
                });
            }
            MergePolicy::Combine => {
                let stored = self.nodes[node].leaf.as_ref().unwrap().template.clone();
                let merged = combine_templates(&stored, &category.template);
                let source = format!("{}, {}", stored_source, category.source);
                self.nodes[node].leaf = Some(Leaf {
                    template: merged,
                    source,
                });
            }
        }
    }

    /// Removes all categories a source contributed for a bot, pruning
    /// childless ancestors. Returns the number of categories removed.
    pub fn unload(&mut self, botid: &str, source: &str) -> usize {
        let key = (botid.to_string(), source.to_string());
        let Some(leaves) = self.source_index.remove(&key) else {
            return 0;
        };
        let mut removed = 0;
        for idx in leaves {
            let owned = matches!(&self.nodes[idx].leaf, Some(leaf) if leaf.source.contains(source));
            if owned && self.nodes[idx].leaf.take().is_some() {
                self.total_categories -= 1;
                removed += 1;
                self.prune(idx);
            }
        }
        removed
    }

    fn prune(&mut self, mut idx: usize) {
        while let Some(parent) = self.nodes[idx].parent {
            if !self.nodes[idx].is_empty() {
                break;
            }
            self.nodes[parent].literals.retain(|_, &mut v| v != idx);
            if self.nodes[parent].underscore == Some(idx) {
                self.nodes[parent].underscore = None;
            }
            if self.nodes[parent].star == Some(idx) {
                self.nodes[parent].star = None;
            }
            self.nodes[idx] = Node::new(None);
            self.free.push(idx);
            idx = parent;
        }
    }

    /// Searches for the most specific category matching the given
    /// (input, that, topic) context. Empty context components match as
    /// `*`. Returns `None` on no match or deadline expiry - a
    /// recoverable miss, not a fault.
    pub fn match_path(
        &self,
        input: &str,
        that: &str,
        topic: &str,
        botid: &str,
        deadline: Instant,
    ) -> Option<MatchResult> {
        let root = *self.roots.get(botid)?;

        let mut tokens = non_empty_tokens(input);
        tokens.push(THAT_MARKER.to_string());
        tokens.extend(non_empty_tokens(that));
        tokens.push(TOPIC_MARKER.to_string());
        tokens.extend(non_empty_tokens(topic));

        let mut capture = Capture::default();
        let leaf_idx = self.walk(
            root,
            root,
            &tokens,
            "",
            Segment::Pattern,
            "",
            &mut capture,
            deadline,
        );
        if capture.expired {
            debug!(%input, %botid, "match deadline expired");
            return None;
        }
        let leaf_idx = leaf_idx?;
        let leaf = self.nodes[leaf_idx].leaf.as_ref()?;
        Some(MatchResult {
            template: leaf.template.clone(),
            pattern_stars: capture.pattern_stars,
            that_stars: capture.that_stars,
            topic_stars: capture.topic_stars,
            path: format!(
                "{} : {} : {}",
                capture.pattern_path, capture.that_path, capture.topic_path
            ),
            source: leaf.source.clone(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        node_idx: usize,
        parent_idx: usize,
        tokens: &[String],
        wildcard: &str,
        segment: Segment,
        path: &str,
        capture: &mut Capture,
        deadline: Instant,
    ) -> Option<usize> {
        if capture.expired {
            return None;
        }
        if Instant::now() >= deadline {
            capture.expired = true;
            return None;
        }

        let node = &self.nodes[node_idx];

        // A node deeper than the remaining input cannot reach a leaf.
        if node.height != usize::MAX && tokens.len() < node.height {
            return None;
        }

        if tokens.is_empty() {
            if node.leaf.is_some() {
                if !wildcard.is_empty() {
                    capture.topic_stars.insert(0, wildcard.to_string());
                }
                capture.topic_path = path.to_string();
                return Some(node_idx);
            }
            return None;
        }

        let head = &tokens[0];
        let tail = &tokens[1..];

        // Segment separators are matched literally and close the current
        // segment's open wildcard capture; they are never absorbed by a
        // wildcard, so a failure here dead-ends the whole branch.
        if head == THAT_MARKER || head == TOPIC_MARKER {
            if let Some(&child) = node.literals.get(head.as_str()) {
                let next_segment = if head == THAT_MARKER {
                    Segment::That
                } else {
                    Segment::Topic
                };
                if let Some(leaf) =
                    self.walk(child, node_idx, tail, "", next_segment, "", capture, deadline)
                {
                    match segment {
                        Segment::Pattern => {
                            if !wildcard.is_empty() {
                                capture.pattern_stars.insert(0, wildcard.to_string());
                            }
                            capture.pattern_path = path.to_string();
                        }
                        Segment::That => {
                            if !wildcard.is_empty() {
                                capture.that_stars.insert(0, wildcard.to_string());
                            }
                            capture.that_path = path.to_string();
                        }
                        Segment::Topic => {}
                    }
                    return Some(leaf);
                }
            }
            return None;
        }

        // Literal children first: most specific wins.
        if let Some(&child) = node.literals.get(head.to_uppercase().as_str()) {
            let new_path = join_path(path, &head.to_uppercase());
            if let Some(leaf) = self.walk(
                child, node_idx, tail, wildcard, segment, &new_path, capture, deadline,
            ) {
                return Some(leaf);
            }
        }

        // Then `_`, then `*`. Entering a wildcard branch closes the
        // enclosing capture (pushed on the unwind) and opens a new one
        // seeded with the consumed head.
        for (slot, token) in [(node.underscore, "_"), (node.star, "*")] {
            if let Some(child) = slot {
                let new_path = join_path(path, token);
                if let Some(leaf) = self.walk(
                    child, node_idx, tail, head, segment, &new_path, capture, deadline,
                ) {
                    if !wildcard.is_empty() {
                        push_star(capture, segment, wildcard);
                    }
                    return Some(leaf);
                }
            }
        }

        // If this node is itself a wildcard child, it may keep absorbing
        // tokens into the open capture.
        let parent = &self.nodes[parent_idx];
        if parent.star == Some(node_idx) || parent.underscore == Some(node_idx) {
            let extended = if wildcard.is_empty() {
                head.to_string()
            } else {
                format!("{} {}", wildcard, head)
            };
            return self.walk(
                node_idx, parent_idx, tail, &extended, segment, path, capture, deadline,
            );
        }

        None
    }
}

fn push_star(capture: &mut Capture, segment: Segment, star: &str) {
    let list = match segment {
        Segment::Pattern => &mut capture.pattern_stars,
        Segment::That => &mut capture.that_stars,
        Segment::Topic => &mut capture.topic_stars,
    };
    list.insert(0, star.to_string());
}

fn join_path(path: &str, token: &str) -> String {
    if path.is_empty() {
        token.to_string()
    } else {
        format!("{} {}", path, token)
    }
}

fn non_empty_tokens(text: &str) -> Vec<String> {
    let tokens = word_split(text);
    if tokens.is_empty() {
        vec!["*".to_string()]
    } else {
        tokens
    }
}

/// APPEND merge: the new template's content follows the stored one,
/// around the configured separator.
fn append_templates(stored: &Element, new: &Element, separator: &str) -> Element {
    let mut merged = Element::new("template");
    merged.children.extend(stored.children.clone());
    if !separator.is_empty() {
        merged.children.push(TemplateNode::Text(separator.to_string()));
    }
    merged.children.extend(new.children.clone());
    merged
}

/// COMBINE merge: both templates become equal-probability alternatives
/// of one `random` element, so future matches choose between them with
/// the random handler's per-scope generators.
fn combine_templates(stored: &Element, new: &Element) -> Element {
    let li_of = |template: &Element| {
        let mut li = Element::new("li");
        li.children.extend(template.children.clone());
        TemplateNode::Element(li)
    };

    // An already-combined template just gets one more alternative.
    if let [TemplateNode::Element(random)] = &stored.children[..] {
        if random.name == "random" {
            let mut random = random.clone();
            random.children.push(li_of(new));
            let mut merged = Element::new("template");
            merged.children.push(TemplateNode::Element(random));
            return merged;
        }
    }

    let mut random = Element::new("random");
    random.children.push(li_of(stored));
    random.children.push(li_of(new));
    let mut merged = Element::new("template");
    merged.children.push(TemplateNode::Element(random));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn text_template(text: &str) -> Element {
        let mut template = Element::new("template");
        template
            .children
            .push(TemplateNode::Text(text.to_string()));
        template
    }

    fn store(policy: MergePolicy) -> Graphmaster {
        Graphmaster::new(&MatchingConfig {
            merge_policy: policy,
            merge_append_separator: " ".into(),
            note_each_merge: false,
            response_timeout_ms: 1000,
        })
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    fn add(graph: &mut Graphmaster, pattern: &str, that: &str, topic: &str, reply: &str) {
        let mut category = Category::new(pattern, that, topic, text_template(reply));
        category.source = "test".into();
        graph.add_category("bot", &category);
    }

    fn reply_of(result: &MatchResult) -> String {
        result.template.text_content()
    }

    #[test]
    fn test_all_literal_match_zero_stars() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO THERE", "GOOD DAY", "WEATHER", "hi");
        let result = graph
            .match_path("HELLO THERE", "GOOD DAY", "WEATHER", "bot", deadline())
            .unwrap();
        assert_eq!(reply_of(&result), "hi");
        assert!(result.pattern_stars.is_empty());
        assert!(result.that_stars.is_empty());
        assert!(result.topic_stars.is_empty());
    }

    #[test]
    fn test_case_insensitive_literal_match() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO", "*", "*", "hi");
        assert!(graph.match_path("hello", "*", "*", "bot", deadline()).is_some());
    }

    #[test]
    fn test_single_star_captures_tail() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "MY NAME IS *", "*", "*", "nice");
        let result = graph
            .match_path("MY NAME IS Ada Lovelace", "*", "*", "bot", deadline())
            .unwrap();
        assert_eq!(result.pattern_stars, vec!["Ada Lovelace"]);
    }

    #[test]
    fn test_star_count_equals_wildcard_count_left_to_right() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "* TOLD _ ABOUT *", "*", "*", "gossip");
        let result = graph
            .match_path("ALICE TOLD BOB CAROL ABOUT THE PARTY", "*", "*", "bot", deadline())
            .unwrap();
        assert_eq!(
            result.pattern_stars,
            vec!["ALICE", "BOB CAROL", "THE PARTY"]
        );
    }

    #[test]
    fn test_literal_beats_underscore_beats_star() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO", "*", "*", "literal");
        add(&mut graph, "_", "*", "*", "underscore");
        add(&mut graph, "*", "*", "*", "star");
        let result = graph.match_path("HELLO", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "literal");

        let result = graph.match_path("GOODBYE", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "underscore");

        graph.unload("bot", "test");
        add(&mut graph, "*", "*", "*", "star");
        let result = graph.match_path("ANYTHING", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "star");
    }

    #[test]
    fn test_wildcard_binds_one_or_more() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "A *", "*", "*", "got it");
        // The wildcard needs at least one token after A.
        assert!(graph.match_path("A", "*", "*", "bot", deadline()).is_none());
        assert!(graph.match_path("A B", "*", "*", "bot", deadline()).is_some());
        assert!(graph.match_path("A B C D", "*", "*", "bot", deadline()).is_some());
    }

    #[test]
    fn test_that_context_prefers_specific_category() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "YES", "DO YOU LIKE CATS", "*", "Me too!");
        add(&mut graph, "YES", "*", "*", "I see.");

        let result = graph
            .match_path("YES", "DO YOU LIKE CATS", "*", "bot", deadline())
            .unwrap();
        assert_eq!(reply_of(&result), "Me too!");
        assert!(result.that_stars.is_empty());

        let result = graph
            .match_path("YES", "WHAT IS YOUR NAME", "*", "bot", deadline())
            .unwrap();
        assert_eq!(reply_of(&result), "I see.");
        assert_eq!(result.that_stars, vec!["WHAT IS YOUR NAME"]);
    }

    #[test]
    fn test_topic_stars_captured() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "YES", "*", "THE * WEATHER", "indeed");
        let result = graph
            .match_path("YES", "OK", "THE LOVELY WEATHER", "bot", deadline())
            .unwrap();
        assert_eq!(result.topic_stars, vec!["LOVELY"]);
    }

    #[test]
    fn test_empty_context_matches_as_wildcard() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HI", "*", "*", "hello");
        assert!(graph.match_path("HI", "", "", "bot", deadline()).is_some());
    }

    #[test]
    fn test_no_match_is_none() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO", "*", "*", "hi");
        assert!(graph.match_path("UNKNOWN INPUT", "*", "*", "bot", deadline()).is_none());
        assert!(graph.match_path("HELLO", "*", "*", "other-bot", deadline()).is_none());
    }

    #[test]
    fn test_expired_deadline_yields_none() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO", "*", "*", "hi");
        let expired = Instant::now() - Duration::from_millis(1);
        assert!(graph.match_path("HELLO", "*", "*", "bot", expired).is_none());
    }

    #[test]
    fn test_merge_skip_keeps_first() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HI", "*", "*", "first");
        add(&mut graph, "HI", "*", "*", "second");
        let result = graph.match_path("HI", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "first");
        assert_eq!(graph.category_count(), 1);
        assert_eq!(graph.duplicate_count(), 1);
    }

    #[test]
    fn test_merge_overwrite_keeps_second() {
        let mut graph = store(MergePolicy::Overwrite);
        add(&mut graph, "HI", "*", "*", "first");
        add(&mut graph, "HI", "*", "*", "second");
        let result = graph.match_path("HI", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "second");
    }

    #[test]
    fn test_merge_append_concatenates_with_separator() {
        let mut graph = store(MergePolicy::Append);
        add(&mut graph, "HI", "*", "*", "first");
        add(&mut graph, "HI", "*", "*", "second");
        let result = graph.match_path("HI", "*", "*", "bot", deadline()).unwrap();
        assert_eq!(reply_of(&result), "first second");
    }

    #[test]
    fn test_merge_combine_wraps_alternatives_in_random() {
        let mut graph = store(MergePolicy::Combine);
        add(&mut graph, "HI", "*", "*", "first");
        add(&mut graph, "HI", "*", "*", "second");
        add(&mut graph, "HI", "*", "*", "third");
        let result = graph.match_path("HI", "*", "*", "bot", deadline()).unwrap();
        let root: Vec<_> = result.template.child_elements().collect();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "random");
        let alternatives: Vec<String> = root[0]
            .child_elements()
            .map(|li| li.text_content())
            .collect();
        assert_eq!(alternatives, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unload_removes_and_prunes() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "HELLO THERE FRIEND", "*", "*", "hi");
        assert_eq!(graph.category_count(), 1);
        let nodes_loaded = graph.node_count();
        assert!(nodes_loaded > 1);

        let removed = graph.unload("bot", "test");
        assert_eq!(removed, 1);
        assert_eq!(graph.category_count(), 0);
        assert!(graph.match_path("HELLO THERE FRIEND", "*", "*", "bot", deadline()).is_none());
        assert!(graph.node_count() < nodes_loaded);
    }

    #[test]
    fn test_matched_path_reported() {
        let mut graph = store(MergePolicy::Skip);
        add(&mut graph, "MY NAME IS *", "*", "*", "nice");
        let result = graph
            .match_path("my name is Ada", "*", "*", "bot", deadline())
            .unwrap();
        assert_eq!(result.path, "MY NAME IS * : * : *");
    }
}
