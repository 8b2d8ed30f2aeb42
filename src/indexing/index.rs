use super::normalizer::{normalize_fragment, tokenize_into};
use super::splitter::{fragments, split, SplitStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One searchable verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Position within one ingestion pass
    pub id: u32,
    /// Citation such as "Alma 5:12", or a truncated text prefix
    pub reference: String,
    /// Whitespace-collapsed body
    pub text: String,
}

/// Everything the query engine reads. Built once per ingestion and replaced
/// wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    units: Vec<Unit>,
    vocabulary: Vec<String>,
    front_matter: String,
}

/// Counters reported after a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub fragments: usize,
    pub dropped: usize,
}

impl Index {
    /// Assemble an index from already-derived parts (used when restoring
    /// from the cache). The vocabulary is re-sorted and deduplicated.
    pub fn from_parts(units: Vec<Unit>, mut vocabulary: Vec<String>, front_matter: String) -> Self {
        vocabulary.sort();
        vocabulary.dedup();
        Self {
            units,
            vocabulary,
            front_matter,
        }
    }

    /// Run the splitter and normalizer over a raw document
    pub fn build(raw: &str, strategy: &SplitStrategy, min_unit_chars: usize) -> (Self, BuildStats) {
        let split = split(raw, strategy);
        if let Some(anomaly) = &split.anomaly {
            tracing::warn!("{}", anomaly);
        }

        let mut units = Vec::new();
        let mut vocabulary = BTreeSet::new();
        let mut stats = BuildStats::default();

        for fragment in fragments(split.content) {
            stats.fragments += 1;
            match normalize_fragment(fragment, min_unit_chars) {
                Some(normalized) => {
                    tokenize_into(&normalized.text, &mut vocabulary);
                    units.push(Unit {
                        id: units.len() as u32,
                        reference: normalized.reference,
                        text: normalized.text,
                    });
                }
                None => {
                    stats.dropped += 1;
                    tracing::debug!("Dropping short fragment: {:?}", fragment.trim());
                }
            }
        }

        let index = Self {
            units,
            vocabulary: vocabulary.into_iter().collect(),
            front_matter: split.front_matter.into_owned(),
        };
        (index, stats)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Sorted, deduplicated suggestion vocabulary
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn front_matter(&self) -> &str {
        &self.front_matter
    }

    pub fn unit(&self, id: u32) -> Option<&Unit> {
        self.units.get(id as usize).filter(|unit| unit.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "Header\n\nAlma 5:12\nWherefore I say unto you\n\nShort\n\n";

    fn whole_document() -> SplitStrategy {
        SplitStrategy::LineCount(0)
    }

    #[test]
    fn test_scenario_single_unit() {
        let (index, stats) = Index::build(SCENARIO, &whole_document(), 20);
        assert_eq!(index.units().len(), 1);
        let unit = &index.units()[0];
        assert_eq!(unit.id, 0);
        assert_eq!(unit.reference, "Alma 5:12");
        assert_eq!(unit.text, "Wherefore I say unto you");
        assert_eq!(stats.fragments, 3);
        assert_eq!(stats.dropped, 2);
    }

    #[test]
    fn test_vocabulary_from_text_only() {
        let (index, _) = Index::build(SCENARIO, &whole_document(), 20);
        assert_eq!(index.vocabulary(), &["say", "unto", "wherefore", "you"]);
        // "alma" lives only in the reference, "header" and "short" were dropped
        assert!(!index.vocabulary().iter().any(|w| w == "alma"));
        assert!(!index.vocabulary().iter().any(|w| w == "header" || w == "short"));
    }

    #[test]
    fn test_front_matter_excluded_from_index() {
        let raw = "Copyright notice applies to this edition\n\nTHE FIRST BOOK OF NEPHI\nHIS REIGN AND MINISTRY\n\n1 Nephi 1:1\nI, Nephi, having been born of goodly parents";
        let (index, _) = Index::build(raw, &SplitStrategy::default(), 20);
        assert_eq!(index.front_matter(), "Copyright notice applies to this edition\n\n");
        assert!(!index.vocabulary().iter().any(|w| w == "copyright"));
        assert_eq!(index.units().len(), 2);
        assert_eq!(index.units()[1].reference, "1 Nephi 1:1");
        assert_eq!(index.unit(1), Some(&index.units()[1]));
    }

    #[test]
    fn test_ids_are_sequential() {
        let raw = "first fragment that is long enough\n\ntiny\n\nsecond fragment that is long enough";
        let (index, _) = Index::build(raw, &whole_document(), 20);
        let ids: Vec<u32> = index.units().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_from_parts_sorts_vocabulary() {
        let index = Index::from_parts(
            Vec::new(),
            vec!["zion".to_string(), "alma".to_string(), "zion".to_string()],
            String::new(),
        );
        assert_eq!(index.vocabulary(), &["alma", "zion"]);
    }
}
