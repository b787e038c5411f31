//! Biomedical named entity recognition for corpus filtering.
//!
//! The filter only needs one capability from this crate: given a text, return
//! the categorised entity spans found in it ([`EntityTagger`]). The default
//! implementation is a dictionary tagger built on an Aho-Corasick automaton
//! ([`TrieNer`]), loaded once per process and shared read-only.

mod entity_types;
mod lexicon;
mod tagger;
pub mod trie_ner;

pub use entity_types::{CategorySet, EntityType};
pub use lexicon::{LexiconEntry, LexiconSource};
pub use tagger::EntityTagger;
pub use trie_ner::{ExtractedEntity, TrieNer, TrieStats};

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Lexicon loading failed: {0}")]
    LexiconLoad(String),

    #[error("Automaton construction failed: {0}")]
    Automaton(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<aho_corasick::BuildError> for NerError {
    fn from(e: aho_corasick::BuildError) -> Self {
        NerError::Automaton(e.to_string())
    }
}
