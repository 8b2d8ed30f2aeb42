use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Title line the scripture content starts at in the Gutenberg edition
pub const DEFAULT_CONTENT_MARKER: &str = "THE FIRST BOOK OF NEPHI";

/// Number of leading lines treated as front matter by the line-count strategy
pub const DEFAULT_FRONT_MATTER_LINES: usize = 260;

/// Front matter shown when the content marker cannot be found
pub const MISSING_FRONT_MATTER: &str = "Front matter unavailable: content marker not found.";

/// A blank line (two or more consecutive line breaks) separates fragments
static FRAGMENT_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\r?\n){2,}").expect("fragment break pattern is valid"));

/// How the front matter is separated from searchable content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Content starts at the first occurrence of this string (inclusive)
    Marker(String),
    /// The first N lines are front matter
    LineCount(usize),
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::Marker(DEFAULT_CONTENT_MARKER.to_string())
    }
}

/// Structural surprises in the document. These are logged and always
/// degrade to a fallback, they never fail ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    MarkerNotFound { marker: String },
    TooFewLines { expected: usize, found: usize },
}

impl fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAnomaly::MarkerNotFound { marker } => {
                write!(f, "content marker {:?} not found, indexing whole document", marker)
            }
            ParseAnomaly::TooFewLines { expected, found } => write!(
                f,
                "document has {} lines but {} are reserved for front matter",
                found, expected
            ),
        }
    }
}

/// Result of separating a raw document
#[derive(Debug, Clone)]
pub struct Split<'a> {
    pub front_matter: Cow<'a, str>,
    pub content: &'a str,
    pub anomaly: Option<ParseAnomaly>,
}

/// Separate front matter from content. Never fails.
pub fn split<'a>(raw: &'a str, strategy: &SplitStrategy) -> Split<'a> {
    match strategy {
        SplitStrategy::Marker(marker) => split_at_marker(raw, marker),
        SplitStrategy::LineCount(lines) => split_at_line(raw, *lines),
    }
}

fn split_at_marker<'a>(raw: &'a str, marker: &str) -> Split<'a> {
    match raw.find(marker).filter(|_| !marker.is_empty()) {
        Some(pos) => Split {
            front_matter: Cow::Borrowed(&raw[..pos]),
            content: &raw[pos..],
            anomaly: None,
        },
        None => Split {
            front_matter: Cow::Borrowed(MISSING_FRONT_MATTER),
            content: raw,
            anomaly: Some(ParseAnomaly::MarkerNotFound {
                marker: marker.to_string(),
            }),
        },
    }
}

fn split_at_line(raw: &str, lines: usize) -> Split<'_> {
    let mut offset = 0;
    let mut seen = 0;
    for line in raw.split_inclusive('\n') {
        if seen == lines {
            break;
        }
        offset += line.len();
        seen += 1;
    }

    let anomaly = if offset == raw.len() && lines > 0 {
        Some(ParseAnomaly::TooFewLines {
            expected: lines,
            found: seen,
        })
    } else {
        None
    };

    Split {
        front_matter: Cow::Borrowed(&raw[..offset]),
        content: &raw[offset..],
        anomaly,
    }
}

/// Split the content region into raw fragments at blank lines.
/// Whitespace-only fragments are skipped.
pub fn fragments(content: &str) -> impl Iterator<Item = &str> {
    FRAGMENT_BREAK
        .split(content)
        .filter(|fragment| !fragment.trim().is_empty())
}
