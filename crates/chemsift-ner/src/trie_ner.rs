//! Fast NER using Aho-Corasick tries for dictionary matching.
//!
//! Two automata are built from the loaded lexicons:
//! - lexical terms (chemicals, drugs, diseases, ...) matched ASCII
//!   case-insensitively, so "Cisplatin" and "cisplatin" both hit
//! - symbols (genes, proteins, mutations, cell lines) matched case-sensitively,
//!   so "ATM" the gene does not fire on "atm" the unit
//!
//! A match only counts when it sits on word boundaries. Overlapping matches
//! from either automaton are resolved by keeping the longest leftmost one.
//! Matching is O(n) in the text length.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::{debug, info};

use crate::entity_types::EntityType;
use crate::lexicon::{self, LexiconEntry, LexiconSource};
use crate::tagger::EntityTagger;
use crate::{NerError, Result};

/// A dictionary entity recognizer. Build once, share read-only.
pub struct TrieNer {
    lexical: Option<Matcher>,
    symbols: Option<Matcher>,
    stats: TrieStats,
}

impl std::fmt::Debug for TrieNer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrieNer").field("stats", &self.stats).finish()
    }
}

struct Matcher {
    automaton: AhoCorasick,
    /// pattern index -> (entity_type, canonical_id)
    pattern_info: Vec<(EntityType, String)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrieStats {
    pub gene_count: usize,
    pub disease_count: usize,
    pub chemical_count: usize,
    pub total_patterns: usize,
}

/// An entity extracted from text using dictionary matching.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: EntityType,
    pub start: usize,
    pub end: usize,
    /// Identifier from the lexicon (e.g. `MESH:D003920`), if it had one.
    pub canonical_id: Option<String>,
}

impl TrieNer {
    /// Create with the embedded dictionary only (no file I/O).
    pub fn with_embedded_subset() -> Result<Self> {
        TrieNerBuilder::new().with_embedded().build()
    }

    /// Create from the embedded dictionary (optional) plus on-disk lexicons.
    pub fn from_sources(include_embedded: bool, sources: &[LexiconSource]) -> Result<Self> {
        let mut builder = TrieNerBuilder::new();
        if include_embedded {
            builder = builder.with_embedded();
        }
        for source in sources {
            builder = builder.with_source(source)?;
        }
        builder.build()
    }

    pub fn builder() -> TrieNerBuilder {
        TrieNerBuilder::new()
    }

    /// Extract entities from text using trie matching.
    pub fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();
        for matcher in [&self.lexical, &self.symbols].into_iter().flatten() {
            matcher.find_into(text, &mut entities);
        }
        Self::remove_overlapping(entities)
    }

    /// Get statistics about loaded patterns.
    pub fn stats(&self) -> &TrieStats {
        &self.stats
    }

    fn remove_overlapping(mut entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
        if entities.is_empty() {
            return entities;
        }

        // Sort by start position, then by length (longest first)
        entities.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
        });

        let mut result = Vec::with_capacity(entities.len());
        let mut last_end = 0;

        for entity in entities {
            if entity.start >= last_end {
                last_end = entity.end;
                result.push(entity);
            }
        }

        result
    }
}

impl EntityTagger for TrieNer {
    fn tag(&self, text: &str) -> Vec<ExtractedEntity> {
        self.extract(text)
    }

    fn name(&self) -> &str {
        "trie-ner"
    }
}

impl Matcher {
    fn build(entries: &[&LexiconEntry], case_insensitive: bool) -> Result<Option<Self>> {
        if entries.is_empty() {
            return Ok(None);
        }
        let patterns: Vec<&str> = entries.iter().map(|e| e.term.as_str()).collect();
        let pattern_info = entries
            .iter()
            .map(|e| (e.label, e.canonical_id.clone()))
            .collect();

        // LeftmostLongest ensures we get longest matches first
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(case_insensitive)
            .build(&patterns)?;

        Ok(Some(Self {
            automaton,
            pattern_info,
        }))
    }

    fn find_into(&self, text: &str, out: &mut Vec<ExtractedEntity>) {
        for mat in self.automaton.find_iter(text) {
            if !on_word_boundary(text, mat.start(), mat.end()) {
                continue;
            }
            let (entity_type, canonical_id) = &self.pattern_info[mat.pattern().as_usize()];
            out.push(ExtractedEntity {
                text: text[mat.start()..mat.end()].to_string(),
                label: *entity_type,
                start: mat.start(),
                end: mat.end(),
                canonical_id: (!canonical_id.is_empty()).then(|| canonical_id.clone()),
            });
        }
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn is_symbol_type(t: EntityType) -> bool {
    matches!(
        t,
        EntityType::Gene | EntityType::Protein | EntityType::Mutation | EntityType::CellLine
    )
}

/// Accumulates lexicon entries, then builds the automata.
#[derive(Debug, Default)]
pub struct TrieNerBuilder {
    entries: Vec<LexiconEntry>,
}

impl TrieNerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedded(mut self) -> Self {
        self.entries.extend(lexicon::embedded());
        self
    }

    pub fn with_source(mut self, source: &LexiconSource) -> Result<Self> {
        self.entries.extend(source.load()?);
        Ok(self)
    }

    pub fn with_entries(mut self, entries: impl IntoIterator<Item = LexiconEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    pub fn build(self) -> Result<TrieNer> {
        // First occurrence of a term wins; case folding only for lexical terms.
        let mut seen = HashSet::new();
        let mut lexical = Vec::new();
        let mut symbols = Vec::new();
        for entry in &self.entries {
            let symbol = is_symbol_type(entry.label);
            let key = if symbol {
                entry.term.clone()
            } else {
                entry.term.to_ascii_lowercase()
            };
            if !seen.insert((symbol, key)) {
                continue;
            }
            if symbol {
                symbols.push(entry);
            } else {
                lexical.push(entry);
            }
        }

        if lexical.is_empty() && symbols.is_empty() {
            return Err(NerError::InvalidInput(
                "no lexicon terms loaded; enable the embedded lexicon or add lexicon files"
                    .to_string(),
            ));
        }

        let count = |t: EntityType| {
            lexical
                .iter()
                .chain(symbols.iter())
                .filter(|e| e.label == t)
                .count()
        };
        let stats = TrieStats {
            gene_count: count(EntityType::Gene),
            disease_count: count(EntityType::Disease),
            chemical_count: count(EntityType::Chemical),
            total_patterns: lexical.len() + symbols.len(),
        };
        debug!(
            lexical = lexical.len(),
            symbols = symbols.len(),
            "Building trie automata"
        );

        let ner = TrieNer {
            lexical: Matcher::build(&lexical, true)?,
            symbols: Matcher::build(&symbols, false)?,
            stats,
        };

        info!(
            "TrieNer loaded: {} genes, {} diseases, {} chemicals (total: {})",
            ner.stats.gene_count,
            ner.stats.disease_count,
            ner.stats.chemical_count,
            ner.stats.total_patterns
        );
        Ok(ner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategorySet;

    fn ner() -> TrieNer {
        TrieNer::with_embedded_subset().unwrap()
    }

    #[test]
    fn test_trie_extraction() {
        let entities = ner().extract("KRAS and TP53 mutations in lung cancer treated with cisplatin");

        assert!(entities.iter().any(|e| e.text == "KRAS" && e.label == EntityType::Gene));
        assert!(entities.iter().any(|e| e.text == "TP53"));
        assert!(entities
            .iter()
            .any(|e| e.text == "lung cancer" && e.label == EntityType::Disease));
        assert!(entities
            .iter()
            .any(|e| e.text == "cisplatin" && e.label == EntityType::Chemical));
    }

    #[test]
    fn test_lexical_terms_are_case_insensitive() {
        let entities = ner().extract("Cisplatin induced Nephrotoxicity.");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].text, "Cisplatin");
        assert_eq!(entities[1].label, EntityType::Disease);
    }

    #[test]
    fn test_symbols_are_case_sensitive() {
        let entities = ner().extract("pressure of 1 atm and an apc value");
        assert!(entities.is_empty(), "got {entities:?}");
    }

    #[test]
    fn test_word_boundaries() {
        // "pain" inside "Spain", "tumor" inside "tumorigenesis"
        let entities = ner().extract("Spain tumorigenesis painful");
        assert!(entities.is_empty(), "got {entities:?}");
    }

    #[test]
    fn test_longest_match_wins() {
        let entities = ner().extract("patients with breast cancer");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "breast cancer");
    }

    #[test]
    fn test_count_in_default_categories() {
        let ner = ner();
        let text = "EGFR inhibitor gefitinib in lung cancer with hepatotoxicity";
        assert_eq!(ner.count_in(text, &CategorySet::default()), 3);
    }

    #[test]
    fn test_deterministic_output() {
        let ner = ner();
        let text = "aspirin and ibuprofen for pain and fever";
        assert_eq!(ner.extract(text), ner.extract(text));
    }

    #[test]
    fn test_builder_without_terms_fails() {
        assert!(TrieNer::builder().build().is_err());
        assert!(TrieNer::from_sources(false, &[]).is_err());
    }

    #[test]
    fn test_custom_entries_and_dedup() {
        let ner = TrieNer::builder()
            .with_entries([
                LexiconEntry::new("benzene", EntityType::Chemical, "CHEBI:16716"),
                LexiconEntry::new("Benzene", EntityType::Chemical, "dup"),
            ])
            .build()
            .unwrap();
        assert_eq!(ner.stats().total_patterns, 1);
        let found = ner.extract("BENZENE exposure");
        assert_eq!(found.len(), 1);
        // first entry for a term wins, including its identifier
        assert_eq!(found[0].canonical_id.as_deref(), Some("CHEBI:16716"));
    }

    #[test]
    fn test_from_tsv_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.tsv");
        std::fs::write(&path, "toluene\tCHEMICAL\n").unwrap();

        let ner = TrieNer::from_sources(false, &[LexiconSource::Tsv(path)]).unwrap();
        assert_eq!(ner.stats().chemical_count, 1);
        let found = ner.extract("toluene vapour");
        assert_eq!(found[0].label, EntityType::Chemical);
        assert_eq!(found[0].canonical_id, None);
    }
}
