//! Entity-density keep/discard decision.
//!
//! `threshold = density_percent / 100 * min(word_count, max_chunk_size)`.
//! Only the first `max_chunk_size` characters of the combined text are tagged.
//! The entity count is clamped to the threshold before comparison and the
//! document is kept iff `min(count, threshold) >= threshold`.

use chemsift_ner::{CategorySet, EntityTagger};
use tracing::debug;

use crate::error::{IngestionError, Result};
use crate::models::{Document, FilterDecision};

/// Characters of combined text handed to the tagger.
pub const MAX_CHUNK_SIZE: usize = 25_000;
/// Required entities per 100 words.
pub const DENSITY_PERCENT: f64 = 1.25;

#[derive(Debug, Clone, PartialEq)]
pub struct DensityPolicy {
    pub density_percent: f64,
    pub max_chunk_size: usize,
    pub categories: CategorySet,
    /// A zero threshold (empty document) would otherwise keep vacuously.
    pub keep_empty_documents: bool,
}

impl Default for DensityPolicy {
    fn default() -> Self {
        Self {
            density_percent: DENSITY_PERCENT,
            max_chunk_size: MAX_CHUNK_SIZE,
            categories: CategorySet::default(),
            keep_empty_documents: false,
        }
    }
}

impl DensityPolicy {
    pub fn validate(&self) -> Result<()> {
        if !self.density_percent.is_finite() || self.density_percent <= 0.0 {
            return Err(IngestionError::InvalidInput(format!(
                "density_percent must be a positive number, got {}",
                self.density_percent
            )));
        }
        if self.max_chunk_size == 0 {
            return Err(IngestionError::InvalidInput(
                "max_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.categories.is_empty() {
            return Err(IngestionError::InvalidInput(
                "at least one entity category is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn threshold(&self, word_count: usize) -> f64 {
        let effective_length = word_count.min(self.max_chunk_size);
        (self.density_percent / 100.0) * effective_length as f64
    }

    /// Score a document and decide whether to keep it.
    pub fn decide(&self, document: Document, tagger: &dyn EntityTagger) -> FilterDecision {
        let text = combined_text(&document);
        let word_count = word_count(&text);
        let threshold = self.threshold(word_count);

        if threshold == 0.0 {
            debug!(keep = self.keep_empty_documents, "Zero density threshold");
            return FilterDecision {
                document,
                word_count,
                entity_count: 0,
                threshold,
                score: 0.0,
                keep: self.keep_empty_documents,
            };
        }

        let chunk = char_prefix(&text, self.max_chunk_size);
        let entity_count = tagger.count_in(chunk, &self.categories);
        let score = (entity_count as f64).min(threshold);
        let keep = score >= threshold;

        debug!(word_count, entity_count, threshold, keep, "Density decision");
        FilterDecision {
            document,
            word_count,
            entity_count,
            threshold,
            score,
            keep,
        }
    }
}

/// `title + " " + abstract + " " + body`
pub fn combined_text(doc: &Document) -> String {
    let mut text =
        String::with_capacity(doc.title.len() + doc.abstract_text.len() + doc.body.len() + 2);
    text.push_str(&doc.title);
    text.push(' ');
    text.push_str(&doc.abstract_text);
    text.push(' ');
    text.push_str(&doc.body);
    text
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The first `max_chars` characters (not bytes) of `text`.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
