//! Pattern Arbiter
//!
//! Decides whether a literal string fits a match-path pattern, using the
//! same token semantics as the trie: literal words compare
//! case-insensitively, `_` and `*` bind one or more tokens. Used by the
//! `condition` handler to compare predicate values against `value`
//! attributes.

use thiserror::Error;

use crate::services::normalizer::word_split;

/// Raised when a `value` attribute is not valid pattern syntax.
#[derive(Error, Debug)]
#[error("not a valid match pattern: {0}")]
pub struct NotAPatternError(pub String);

/// Checks whether `literal` fits `pattern`.
///
/// Returns an error for non-pattern syntax so the caller can log and
/// treat the comparison as non-matching.
pub fn matches_pattern(literal: &str, pattern: &str) -> Result<bool, NotAPatternError> {
    validate(pattern)?;
    let literal_tokens: Vec<String> = word_split(&literal.to_uppercase());
    let pattern_tokens: Vec<String> = word_split(&pattern.to_uppercase());
    Ok(match_tokens(&literal_tokens, &pattern_tokens))
}

fn validate(pattern: &str) -> Result<(), NotAPatternError> {
    if pattern
        .chars()
        .any(|c| !(c.is_alphanumeric() || c == ' ' || c == '*' || c == '_'))
    {
        return Err(NotAPatternError(pattern.to_string()));
    }
    Ok(())
}

fn match_tokens(literal: &[String], pattern: &[String]) -> bool {
    let Some(head) = pattern.first() else {
        return literal.is_empty();
    };
    if head == "*" || head == "_" {
        // One-or-more binding, leftmost-greedy via backtracking.
        (1..=literal.len()).any(|taken| match_tokens(&literal[taken..], &pattern[1..]))
    } else {
        literal
            .first()
            .is_some_and(|first| first == head && match_tokens(&literal[1..], &pattern[1..]))
    }
}
