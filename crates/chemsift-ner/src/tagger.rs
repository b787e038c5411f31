//! The oracle seam between the document filter and entity recognition.

use crate::entity_types::CategorySet;
use crate::trie_ner::ExtractedEntity;

/// Something that tags entities in free text.
///
/// Implementations are loaded once and reused for every document in a run, so
/// `tag` takes `&self`. Output must be deterministic for identical input.
pub trait EntityTagger: Send + Sync {
    /// Return every entity span found in `text`.
    fn tag(&self, text: &str) -> Vec<ExtractedEntity>;

    /// Count tagged entities whose label is in `categories`.
    fn count_in(&self, text: &str, categories: &CategorySet) -> usize {
        self.tag(text)
            .iter()
            .filter(|e| categories.contains(e.label))
            .count()
    }

    /// Short human-readable name used in logs.
    fn name(&self) -> &str {
        "tagger"
    }
}

impl<T: EntityTagger + ?Sized> EntityTagger for std::sync::Arc<T> {
    fn tag(&self, text: &str) -> Vec<ExtractedEntity> {
        (**self).tag(text)
    }

    fn count_in(&self, text: &str, categories: &CategorySet) -> usize {
        (**self).count_in(text, categories)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: EntityTagger + ?Sized> EntityTagger for &T {
    fn tag(&self, text: &str) -> Vec<ExtractedEntity> {
        (**self).tag(text)
    }

    fn count_in(&self, text: &str, categories: &CategorySet) -> usize {
        (**self).count_in(text, categories)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
