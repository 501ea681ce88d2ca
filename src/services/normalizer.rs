//! Input Normalization
//!
//! Mirrors the classic input-normalization stages: substitution
//! application, sentence splitting, and pattern-fitting. Pattern-fitting
//! strips markup and every character that is not legal in a match path
//! (letters, digits, space, the two wildcards), collapsing whitespace.
//! Case is preserved so wildcard captures keep their original form; the
//! trie compares tokens case-insensitively.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters not legal in a match path, case kept.
static ILLEGAL_PATTERN_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N} \*_]+").expect("invalid pattern-fit regex"));

/// Markup elements embedded in replies (stripped before history pushes).
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid markup regex"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Removes markup tags from a string.
pub fn remove_markup(input: &str) -> String {
    MARKUP.replace_all(input, " ").to_string()
}

/// Collapses all whitespace runs to single spaces and trims.
pub fn normalize_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").to_string()
}

/// Pattern-fits an input for matching: markup and illegal characters
/// removed, whitespace collapsed, case preserved.
pub fn pattern_fit(input: &str) -> String {
    let stripped = remove_markup(input);
    let legal = ILLEGAL_PATTERN_CHARACTERS.replace_all(&stripped, " ");
    normalize_whitespace(&legal)
}

/// Splits a string into whitespace-delimited tokens.
pub fn word_split(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// Applies an ordered find/replace map, case-insensitively and on word
/// boundaries.
///
/// The input is scanned left to right once; at each position the pairs
/// are tried in declaration order and the first match wins. Replaced
/// text is never rescanned, so swap pairs ("you are" <-> "I am") do not
/// undo each other, and a match must not sit inside a longer word ("he"
/// never matches inside "the").
pub fn apply_substitutions(substitutions: &[(String, String)], input: &str) -> String {
    fn fold(c: char) -> char {
        c.to_lowercase().next().unwrap_or(c)
    }

    let original: Vec<char> = input.chars().collect();
    let folded: Vec<char> = original.iter().map(|&c| fold(c)).collect();
    let finds: Vec<(Vec<char>, &str)> = substitutions
        .iter()
        .filter(|(find, _)| !find.is_empty())
        .map(|(find, replace)| (find.chars().map(fold).collect(), replace.as_str()))
        .collect();

    let on_boundary = |position: usize| {
        position == 0 || position >= folded.len() || !folded[position].is_alphanumeric()
    };

    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;
    while cursor < original.len() {
        let matched = finds.iter().find(|(find, _)| {
            folded[cursor..].starts_with(find.as_slice())
                && (cursor == 0 || !folded[cursor - 1].is_alphanumeric())
                && on_boundary(cursor + find.len())
        });
        match matched {
            Some((find, replace)) => {
                output.push_str(replace);
                cursor += find.len();
            }
            None => {
                output.push(original[cursor]);
                cursor += 1;
            }
        }
    }
    output
}

/// Splits an input into sentences on the given splitter strings.
///
/// Splitters are kept out of the result; empty fragments are dropped.
/// An input with no splitter in it comes back as a single sentence.
pub fn sentence_split(splitters: &[String], input: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < input.len() {
        let rest = &input[i..];
        match splitters
            .iter()
            .find(|s| !s.is_empty() && rest.starts_with(s.as_str()))
        {
            Some(splitter) => {
                let sentence = input[start..i].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                i += splitter.len();
                start = i;
            }
            None => {
                i += rest.chars().next().map(char::len_utf8).unwrap_or(1);
            }
        }
    }
    let tail = input[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    if sentences.is_empty() {
        sentences.push(String::new());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello, world!", "Hello world")]
    #[case("what's up?", "what s up")]
    #[case("  MY   NAME  IS ADA ", "MY NAME IS ADA")]
    #[case("<b>bold</b> move", "bold move")]
    fn test_pattern_fit(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(pattern_fit(input), expected);
    }

    #[test]
    fn test_pattern_fit_keeps_wildcards() {
        assert_eq!(pattern_fit("MY NAME IS *"), "MY NAME IS *");
    }

    #[test]
    fn test_word_split() {
        assert_eq!(word_split("MY NAME IS ADA"), vec!["MY", "NAME", "IS", "ADA"]);
        assert!(word_split("   ").is_empty());
    }

    #[test]
    fn test_apply_substitutions_case_insensitive_ordered() {
        let subs = vec![
            ("don't".to_string(), "do not".to_string()),
            ("i'm".to_string(), "I am".to_string()),
        ];
        assert_eq!(
            apply_substitutions(&subs, "I'm sure I DON'T know"),
            "I am sure I do not know"
        );
    }

    #[test]
    fn test_substitutions_respect_word_boundaries() {
        let subs = vec![
            ("he".to_string(), "she".to_string()),
            ("me".to_string(), "you".to_string()),
        ];
        assert_eq!(
            apply_substitutions(&subs, "the man told he would meet me"),
            "the man told she would meet you"
        );
    }

    #[test]
    fn test_swap_pairs_do_not_undo_each_other() {
        let subs = vec![
            ("you are".to_string(), "I am".to_string()),
            ("I am".to_string(), "you are".to_string()),
        ];
        assert_eq!(apply_substitutions(&subs, "you are late"), "I am late");
        assert_eq!(apply_substitutions(&subs, "I am late"), "you are late");
    }

    #[test]
    fn test_sentence_split_basic() {
        let splitters: Vec<String> = vec![".".into(), "!".into(), "?".into()];
        assert_eq!(
            sentence_split(&splitters, "Hello there. How are you? Fine!"),
            vec!["Hello there", "How are you", "Fine"]
        );
    }

    #[test]
    fn test_sentence_split_no_splitter() {
        let splitters: Vec<String> = vec![".".into()];
        assert_eq!(sentence_split(&splitters, "no punctuation"), vec!["no punctuation"]);
    }

    #[test]
    fn test_sentence_split_empty_input_yields_one_empty_sentence() {
        let splitters: Vec<String> = vec![".".into()];
        assert_eq!(sentence_split(&splitters, ""), vec![String::new()]);
    }
}
