//! The chunking algorithm itself (§4.2).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkerConfig;
use crate::error::ChunkError;
use crate::heading::{find_headings, is_heading_line};
use crate::sentence::{last_sentence_boundary, split_sentences};
use crate::types::{Chunk, ChunkMetadata};

static RUNS_OF_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+").unwrap());

/// A single logical section: either the synthetic "Introduction" span
/// preceding the first heading, or the span from one heading up to (but
/// not including) the next.
struct Section {
    heading_level: Option<u8>,
    heading_title: Option<String>,
    body: String,
}

/// An un-merged, overlap-free candidate chunk produced while walking
/// sections/paragraphs/sentences.
#[derive(Clone)]
struct RawChunk {
    body: String,
    heading_level: Option<u8>,
    heading_title: Option<String>,
    section_start: bool,
}

/// Normalizes line endings, trims trailing per-line whitespace, and
/// collapses runs of 3+ newlines to exactly 2 (§4.2 step 1).
#[must_use]
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed: Vec<&str> = unified.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    RUNS_OF_BLANK_LINES.replace_all(&joined, "\n\n").into_owned()
}

/// Splits `text` into chunks per the configured algorithm.
///
/// # Errors
/// Returns [`ChunkError::InvalidConfig`] if `config` is internally inconsistent.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>, ChunkError> {
    config.validate()?;

    let normalized = normalize(text);
    let sections = split_into_sections(&normalized, config);

    let mut raw: Vec<RawChunk> = Vec::new();
    for section in &sections {
        let section_raw = chunk_section(&section.body, config);
        for (i, mut rc) in section_raw.into_iter().enumerate() {
            rc.heading_level = section.heading_level;
            rc.heading_title = section.heading_title.clone();
            rc.section_start = i == 0;
            raw.push(rc);
        }
    }

    let merged = merge_and_drop_small(raw, config);
    let with_overlap = apply_overlap(merged, config);
    Ok(finalize(with_overlap))
}

/// Identifies heading spans and builds one [`Section`] per heading, plus a
/// leading "Introduction" section for text before the first heading
/// (§4.2 step 2). When `preserve_structure`/`split_on_headings` is off, or
/// no headings are found, the whole document is a single section.
fn split_into_sections(text: &str, config: &ChunkerConfig) -> Vec<Section> {
    if !config.preserve_structure || !config.split_on_headings {
        return vec![Section {
            heading_level: None,
            heading_title: None,
            body: text.to_string(),
        }];
    }

    let headings = find_headings(text);
    if headings.is_empty() {
        return vec![Section {
            heading_level: None,
            heading_title: None,
            body: text.to_string(),
        }];
    }

    let mut sections = Vec::new();
    let first_offset = headings[0].offset;
    if first_offset > 0 {
        let intro = text[..first_offset].trim_end_matches('\n');
        if !intro.trim().is_empty() {
            sections.push(Section {
                heading_level: None,
                heading_title: Some("Introduction".to_string()),
                body: intro.to_string(),
            });
        }
    }

    for (idx, heading) in headings.iter().enumerate() {
        let end = headings.get(idx + 1).map_or(text.len(), |h| h.offset);
        let body = text[heading.offset..end].trim_end_matches('\n').to_string();
        sections.push(Section {
            heading_level: Some(heading.level),
            heading_title: Some(heading.title.clone()),
            body,
        });
    }

    sections
}

/// Accumulates paragraphs within one section, flushing a chunk whenever
/// the next paragraph would push it past `max_chunk_size` (§4.2 step 3),
/// degrading to sentence splitting for any paragraph that alone exceeds
/// the limit, or for the whole section when no paragraph breaks exist
/// (§4.2 step 4).
fn chunk_section(body: &str, config: &ChunkerConfig) -> Vec<RawChunk> {
    let paragraphs: Vec<&str> = if config.split_on_paragraphs {
        body.split("\n\n").filter(|p| !p.trim().is_empty()).collect()
    } else {
        vec![body]
    };

    if paragraphs.len() <= 1 {
        let whole = paragraphs.first().copied().unwrap_or(body);
        if whole.len() > config.max_chunk_size && config.split_on_sentences {
            return chunk_by_sentences(whole, config);
        }
        return vec![raw(whole)];
    }

    let mut out = Vec::new();
    let mut current = String::new();

    for para in paragraphs {
        let candidate_len = if current.is_empty() {
            para.len()
        } else {
            current.len() + 2 + para.len()
        };

        if candidate_len > config.max_chunk_size && !current.is_empty() {
            out.push(raw(&current));
            current.clear();
        }

        if para.len() > config.max_chunk_size {
            if !current.is_empty() {
                out.push(raw(&current));
                current.clear();
            }
            if config.split_on_sentences {
                out.extend(chunk_by_sentences(para, config));
            } else {
                out.push(raw(para));
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(para);
        } else {
            current.push_str("\n\n");
            current.push_str(para);
        }
    }

    if !current.is_empty() {
        out.push(raw(&current));
    }

    out
}

/// Splits an over-long paragraph into sentences, accumulating them the
/// same way paragraphs accumulate, with a hard word-wrap fallback for any
/// single sentence that still exceeds `max_chunk_size`.
fn chunk_by_sentences(text: &str, config: &ChunkerConfig) -> Vec<RawChunk> {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return vec![raw(text)];
    }

    let mut out = Vec::new();
    let mut current = String::new();

    for sentence in sentences {
        let candidate_len = if current.is_empty() {
            sentence.len()
        } else {
            current.len() + 1 + sentence.len()
        };

        if candidate_len > config.max_chunk_size && !current.is_empty() {
            out.push(raw(&current));
            current.clear();
        }

        if sentence.len() > config.max_chunk_size {
            if !current.is_empty() {
                out.push(raw(&current));
                current.clear();
            }
            out.extend(word_wrap(sentence, config.max_chunk_size));
            continue;
        }

        if current.is_empty() {
            current.push_str(sentence);
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        out.push(raw(&current));
    }

    out
}

/// Last-resort split for a single token run (or sentence) with no
/// punctuation boundaries at all, cutting on whitespace near `limit`.
fn word_wrap(text: &str, limit: usize) -> Vec<RawChunk> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate_len = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };
        if candidate_len > limit && !current.is_empty() {
            out.push(raw(&current));
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(raw(&current));
    }
    out
}

fn raw(body: &str) -> RawChunk {
    RawChunk {
        body: body.to_string(),
        heading_level: None,
        heading_title: None,
        section_start: false,
    }
}

/// Merges any chunk under `min_chunk_size` into its predecessor if the
/// combination still fits `max_chunk_size`; otherwise drops it if it's
/// under half of `min_chunk_size` (§4.2 step 5).
fn merge_and_drop_small(raw_chunks: Vec<RawChunk>, config: &ChunkerConfig) -> Vec<RawChunk> {
    let mut out: Vec<RawChunk> = Vec::with_capacity(raw_chunks.len());

    for chunk in raw_chunks {
        if chunk.body.len() >= config.min_chunk_size || out.is_empty() {
            out.push(chunk);
            continue;
        }

        let prev = out.last().unwrap();
        let combined_len = prev.body.len() + 2 + chunk.body.len();
        if combined_len <= config.max_chunk_size {
            let prev = out.last_mut().unwrap();
            prev.body.push_str("\n\n");
            prev.body.push_str(&chunk.body);
        } else if chunk.body.len() >= config.min_chunk_size / 2 {
            out.push(chunk);
        }
        // else: dropped
    }

    out
}

/// Prepends an overlap suffix from each chunk's predecessor, preferring a
/// sentence-boundary-aligned tail and falling back to a word-aligned cut
/// (§4.2 step 3).
fn apply_overlap(raw_chunks: Vec<RawChunk>, config: &ChunkerConfig) -> Vec<(RawChunk, String)> {
    let mut out = Vec::with_capacity(raw_chunks.len());
    let mut prev_body: Option<String> = None;

    for chunk in raw_chunks {
        let overlap = prev_body
            .as_deref()
            .map(|p| compute_overlap(p, config.overlap_size))
            .unwrap_or_default();
        prev_body = Some(chunk.body.clone());
        out.push((chunk, overlap));
    }

    out
}

fn compute_overlap(prev_body: &str, overlap_size: usize) -> String {
    if overlap_size == 0 || prev_body.is_empty() {
        return String::new();
    }

    let mut tail_start = prev_body.len().saturating_sub(overlap_size);
    while tail_start < prev_body.len() && !prev_body.is_char_boundary(tail_start) {
        tail_start += 1;
    }
    let window = &prev_body[tail_start..];

    if let Some(pos) = last_sentence_boundary(window) {
        return window[pos..].trim_start().to_string();
    }

    match window.find(char::is_whitespace) {
        Some(pos) if pos + 1 < window.len() => window[pos + 1..].trim_start().to_string(),
        _ => window.trim_start().to_string(),
    }
}

/// Assembles final [`Chunk`]s with computed metadata and `total_chunks`
/// filled in (§4.2 step 6).
fn finalize(with_overlap: Vec<(RawChunk, String)>) -> Vec<Chunk> {
    let total = with_overlap.len();
    with_overlap
        .into_iter()
        .enumerate()
        .map(|(idx, (raw_chunk, overlap))| {
            let text = if overlap.is_empty() {
                raw_chunk.body.clone()
            } else {
                format!("{overlap} {}", raw_chunk.body)
            };
            let overlap_prefix_bytes = text.len() - raw_chunk.body.len();

            let word_count = raw_chunk.body.split_whitespace().count();
            let contains_code = raw_chunk.body.contains("```") || raw_chunk.body.lines().any(|l| l.starts_with("    "));
            let contains_list = LIST_ITEM.is_match(&raw_chunk.body);
            let contains_headings = raw_chunk.body.lines().any(is_heading_line);

            Chunk {
                metadata: ChunkMetadata {
                    chunk_index: idx,
                    chunk_size: text.chars().count(),
                    word_count,
                    heading_level: raw_chunk.heading_level,
                    heading_title: raw_chunk.heading_title.clone(),
                    section_start: raw_chunk.section_start,
                    contains_code,
                    contains_list,
                    contains_headings,
                    total_chunks: total,
                    overlap_prefix_bytes,
                },
                text,
            }
        })
        .collect()
}
