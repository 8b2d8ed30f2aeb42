use crate::core::config::QueryLimits;
use crate::indexing::index::{Index, Unit};
use regex::{Regex, RegexBuilder};

/// Units matching a query, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults<'a> {
    pub units: Vec<&'a Unit>,
    /// The result cap was reached; more matches may exist
    pub truncated: bool,
}

impl SearchResults<'_> {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// User-facing summary line
    pub fn summary(&self) -> String {
        match (self.units.len(), self.truncated) {
            (0, _) => "No matches found.".to_string(),
            (n, true) => format!("Showing the first {} matches. Refine your search to narrow them down.", n),
            (1, false) => "1 match found.".to_string(),
            (n, false) => format!("{} matches found.", n),
        }
    }
}

/// A run of highlighted or plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub text: &'a str,
    pub emphasized: bool,
}

/// Vocabulary words starting with `prefix`, case-insensitive, in
/// lexicographic order. Prefixes shorter than the configured minimum yield
/// nothing.
pub fn suggest<'a>(index: &'a Index, prefix: &str, limits: &QueryLimits) -> Vec<&'a str> {
    if prefix.chars().count() < limits.min_prefix_chars {
        return Vec::new();
    }
    let prefix = prefix.to_lowercase();

    // The vocabulary is sorted, so matches form one contiguous run.
    let vocabulary = index.vocabulary();
    let start = vocabulary.partition_point(|word| word.as_str() < prefix.as_str());
    vocabulary[start..]
        .iter()
        .take_while(|word| word.starts_with(&prefix))
        .take(limits.max_suggestions)
        .map(String::as_str)
        .collect()
}

/// Case-insensitive substring search over unit text.
///
/// Returns `None` for an empty query: no search is performed. Matching uses
/// the same rule as [`highlight`], so every returned unit has something to
/// emphasize.
pub fn search<'a>(index: &'a Index, query: &str, limits: &QueryLimits) -> Option<SearchResults<'a>> {
    if query.is_empty() {
        return None;
    }
    let units: Vec<&Unit> = match literal_pattern(query) {
        Some(pattern) => index
            .units()
            .iter()
            .filter(|unit| pattern.is_match(&unit.text))
            .take(limits.max_results)
            .collect(),
        None => Vec::new(),
    };

    let truncated = units.len() == limits.max_results;
    Some(SearchResults { units, truncated })
}

/// Split `text` into plain and emphasized fragments, one emphasized fragment
/// per case-insensitive occurrence of `query`. The query is matched
/// literally. Concatenating the fragments yields `text` unchanged.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Fragment<'a>> {
    let Some(pattern) = literal_pattern(query) else {
        return vec![Fragment { text, emphasized: false }];
    };

    let mut fragments = Vec::new();
    let mut last = 0;
    for found in pattern.find_iter(text) {
        if found.start() > last {
            fragments.push(Fragment {
                text: &text[last..found.start()],
                emphasized: false,
            });
        }
        fragments.push(Fragment {
            text: found.as_str(),
            emphasized: true,
        });
        last = found.end();
    }
    if last < text.len() || fragments.is_empty() {
        fragments.push(Fragment {
            text: &text[last..],
            emphasized: false,
        });
    }
    fragments
}

/// Case-insensitive matcher for `query` taken literally. `None` for an empty
/// query or one too large to compile.
fn literal_pattern(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::warn!("Cannot match {:?}: {}", query, e);
            None
        }
    }
}

/// Wrap every occurrence of `query` in `text` with `open` and `close`
pub fn highlight_with(text: &str, query: &str, open: &str, close: &str) -> String {
    let mut marked = String::with_capacity(text.len());
    for fragment in highlight(text, query) {
        if fragment.emphasized {
            marked.push_str(open);
            marked.push_str(fragment.text);
            marked.push_str(close);
        } else {
            marked.push_str(fragment.text);
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::splitter::SplitStrategy;

    fn index_of(raw: &str) -> Index {
        Index::build(raw, &SplitStrategy::LineCount(0), 20).0
    }

    fn numbered_index(count: usize) -> Index {
        let raw = (0..count)
            .map(|i| format!("Mosiah {}:1\nAnd the people did rejoice number {}", i + 1, i))
            .collect::<Vec<_>>()
            .join("\n\n");
        index_of(&raw)
    }

    #[test]
    fn test_suggest_minimum_prefix() {
        let index = index_of("Alma 5:12\nWherefore I say unto you");
        let limits = QueryLimits::default();
        assert!(suggest(&index, "", &limits).is_empty());
        assert!(suggest(&index, "w", &limits).is_empty());
        assert_eq!(suggest(&index, "WH", &limits), vec!["wherefore"]);
    }

    #[test]
    fn test_suggest_order_and_cap() {
        let words: Vec<String> = (b'a'..=b'z')
            .map(|c| format!("pre{}{}x", c as char, c as char))
            .collect();
        let index = Index::from_parts(Vec::new(), words, String::new());
        let limits = QueryLimits::default();

        let found = suggest(&index, "Pre", &limits);
        assert_eq!(found.len(), 15);
        assert_eq!(found[0], "preaax");
        assert!(found.windows(2).all(|w| w[0] < w[1]));
        assert!(found.iter().all(|w| w.starts_with("pre")));
    }

    #[test]
    fn test_suggest_no_match() {
        let index = index_of("Alma 5:12\nWherefore I say unto you");
        assert!(suggest(&index, "zz", &QueryLimits::default()).is_empty());
    }

    #[test]
    fn test_search_empty_query_skipped() {
        let index = index_of("Alma 5:12\nWherefore I say unto you");
        assert!(search(&index, "", &QueryLimits::default()).is_none());
    }

    #[test]
    fn test_search_whitespace_query_runs() {
        let index = index_of("Alma 5:12\nWherefore I say unto you\n\nAlma 5:13\nAnd they did whet their swords");
        let limits = QueryLimits::default();
        let results = search(&index, " ", &limits).unwrap();
        assert_eq!(results.len(), 2);
        assert!(search(&index, "   ", &limits).unwrap().is_empty());
    }

    #[test]
    fn test_search_agrees_with_highlight() {
        let index = index_of("Helaman 1:1\nThe city of İznik stood upon the hill\n\nHelaman 1:2\nAnd ÆTHER was the name of the prophet");
        let limits = QueryLimits::default();

        // "i̇" is the full lowercase of "İ", but not a case-insensitive match for it.
        assert!(search(&index, "i\u{307}", &limits).unwrap().is_empty());

        for query in ["æther", "İZNIK", "i\u{307}", "city"] {
            for unit in search(&index, query, &limits).unwrap().units {
                assert!(
                    highlight(&unit.text, query).iter().any(|f| f.emphasized),
                    "{:?} returned {:?} without emphasis",
                    query,
                    unit.text
                );
            }
        }
        assert_eq!(search(&index, "æther", &limits).unwrap().len(), 1);
    }

    #[test]
    fn test_search_matches_text_not_reference() {
        let index = index_of("Alma 5:12\nWherefore I say unto you");
        let limits = QueryLimits::default();
        assert_eq!(search(&index, "WHEREFORE", &limits).unwrap().len(), 1);
        assert!(search(&index, "Alma", &limits).unwrap().is_empty());
    }

    #[test]
    fn test_search_truncated_at_cap() {
        let index = numbered_index(60);
        let results = search(&index, "rejoice", &QueryLimits::default()).unwrap();
        assert_eq!(results.len(), 50);
        assert!(results.truncated);
        let ids: Vec<u32> = results.units.iter().map(|u| u.id).collect();
        assert_eq!(ids, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn test_search_exhausted_below_cap() {
        let index = numbered_index(12);
        let results = search(&index, "rejoice", &QueryLimits::default()).unwrap();
        assert_eq!(results.len(), 12);
        assert!(!results.truncated);
        assert_eq!(results.summary(), "12 matches found.");
    }

    #[test]
    fn test_highlight_case_insensitive() {
        let fragments = highlight("Wherefore, wherefore I say", "WHEREFORE");
        assert_eq!(
            fragments,
            vec![
                Fragment { text: "Wherefore", emphasized: true },
                Fragment { text: ", ", emphasized: false },
                Fragment { text: "wherefore", emphasized: true },
                Fragment { text: " I say", emphasized: false },
            ]
        );
    }

    #[test]
    fn test_highlight_literal_metacharacters() {
        let text = "Is it (a.k.a.) 1+1? Yes (a.k.a.) it is";
        assert_eq!(
            highlight_with(text, "(a.k.a.)", "[", "]"),
            "Is it [(a.k.a.)] 1+1? Yes [(a.k.a.)] it is"
        );
        assert_eq!(highlight_with(text, "1+1?", "[", "]"), "Is it (a.k.a.) [1+1?] Yes (a.k.a.) it is");
        assert_eq!(highlight_with("axb", ".", "[", "]"), "axb");
    }

    #[test]
    fn test_highlight_preserves_text() {
        let text = "And it came to pass";
        let joined: String = highlight(text, "zzz").iter().map(|f| f.text).collect();
        assert_eq!(joined, text);
        assert_eq!(highlight(text, "").len(), 1);
    }
}
