//! Output types produced by the chunking algorithm.

use serde::{Deserialize, Serialize};

/// Per-chunk metadata (§4.2 step 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_index: usize,
    pub chunk_size: usize,
    pub word_count: usize,
    pub heading_level: Option<u8>,
    pub heading_title: Option<String>,
    pub section_start: bool,
    pub contains_code: bool,
    pub contains_list: bool,
    pub contains_headings: bool,
    /// Filled in once the full chunk list is known (finalize step).
    pub total_chunks: usize,
    /// Byte length of the overlap prefix carried over from the previous
    /// chunk; callers reconstructing the source text should skip this many
    /// bytes of `Chunk::text` before concatenating.
    pub overlap_prefix_bytes: usize,
}

/// One chunk ready for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// The portion of `text` that is new to this chunk (i.e. `text` with
    /// the overlap prefix carried from the previous chunk removed).
    #[must_use]
    pub fn body(&self) -> &str {
        &self.text[self.metadata.overlap_prefix_bytes..]
    }
}

/// Concatenates chunk bodies (overlap trimmed) back into one string,
/// joined by a single space — used to check the round-trip invariant
/// "up to whitespace normalization" (§4.2 Invariant, §8 invariant 3).
#[must_use]
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(Chunk::body)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses every run of whitespace to a single space and trims the ends,
/// for whitespace-tolerant equality checks.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}
