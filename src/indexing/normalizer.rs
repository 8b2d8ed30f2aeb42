use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// First lines at or above this length are never treated as a reference
const MAX_REFERENCE_CHARS: usize = 50;

/// Length of the text prefix used when no reference is detected
const FALLBACK_REFERENCE_CHARS: usize = 30;

const ELLIPSIS: &str = "...";

/// Shortest token kept in the vocabulary
pub const MIN_TOKEN_CHARS: usize = 3;

/// Chapter:verse style citation, e.g. "Alma 5:12"
static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+:\d+").expect("citation pattern is valid"));

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("word pattern is valid"));

/// A fragment after cleaning, before it is numbered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFragment {
    pub reference: String,
    pub text: String,
}

/// Trim and collapse every whitespace run to a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a raw fragment and split off its reference label.
///
/// Returns `None` when the cleaned fragment is `min_chars` characters or
/// shorter. Reference detection is a heuristic: a short first line holding a
/// `digits:digits` citation becomes the reference, anything else falls back to
/// a truncated prefix of the text.
pub fn normalize_fragment(fragment: &str, min_chars: usize) -> Option<NormalizedFragment> {
    let cleaned = collapse_whitespace(fragment);
    if cleaned.chars().count() <= min_chars {
        return None;
    }

    let lines: Vec<&str> = fragment
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if let [first, rest @ ..] = lines.as_slice() {
        if !rest.is_empty()
            && first.chars().count() < MAX_REFERENCE_CHARS
            && CITATION.is_match(first)
        {
            return Some(NormalizedFragment {
                reference: collapse_whitespace(first),
                text: collapse_whitespace(&rest.join(" ")),
            });
        }
    }

    Some(NormalizedFragment {
        reference: fallback_reference(&cleaned),
        text: cleaned,
    })
}

fn fallback_reference(cleaned: &str) -> String {
    let mut reference: String = cleaned.chars().take(FALLBACK_REFERENCE_CHARS).collect();
    reference.push_str(ELLIPSIS);
    reference
}

/// Add every lowercase ASCII letter run of at least three characters in
/// `text` to `vocabulary`. Digits and punctuation only separate tokens.
pub fn tokenize_into(text: &str, vocabulary: &mut BTreeSet<String>) {
    let lower = text.to_lowercase();
    for token in WORD.find_iter(&lower) {
        let token = token.as_str();
        if token.len() >= MIN_TOKEN_CHARS && !vocabulary.contains(token) {
            vocabulary.insert(token.to_string());
        }
    }
}

/// Distinct tokens of `text`, sorted
pub fn tokenize(text: &str) -> Vec<String> {
    let mut vocabulary = BTreeSet::new();
    tokenize_into(text, &mut vocabulary);
    vocabulary.into_iter().collect()
}
