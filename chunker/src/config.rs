//! Enumerated chunker configuration (§4.2 — "no dynamic kwargs").

use serde::{Deserialize, Serialize};

use crate::error::ChunkError;

/// All tunables the chunking algorithm accepts. Every field is a concrete
/// type with a documented default; there is no free-form options map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Soft ceiling on chunk size, in characters.
    pub max_chunk_size: usize,
    /// Chunks smaller than this are merged into a neighbor or dropped.
    pub min_chunk_size: usize,
    /// Size, in characters, of the overlap suffix carried into the next chunk.
    pub overlap_size: usize,
    /// Identify Markdown heading spans and chunk section-by-section.
    pub preserve_structure: bool,
    /// Split sections at `#`..`######` heading boundaries.
    pub split_on_headings: bool,
    /// Accumulate blank-line-separated paragraphs before falling back to sentences.
    pub split_on_paragraphs: bool,
    /// Split an over-long paragraph into sentences (abbreviation-aware).
    pub split_on_sentences: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            min_chunk_size: 100,
            overlap_size: 200,
            preserve_structure: true,
            split_on_headings: true,
            split_on_paragraphs: true,
            split_on_sentences: true,
        }
    }
}

impl ChunkerConfig {
    /// Validates the configuration's internal consistency.
    ///
    /// # Errors
    /// Returns [`ChunkError::InvalidConfig`] if size relationships don't hold.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "max_chunk_size must be > 0".into(),
            ));
        }
        if self.min_chunk_size >= self.max_chunk_size {
            return Err(ChunkError::InvalidConfig(
                "min_chunk_size must be less than max_chunk_size".into(),
            ));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(ChunkError::InvalidConfig(
                "overlap_size must be less than max_chunk_size".into(),
            ));
        }
        Ok(())
    }
}
