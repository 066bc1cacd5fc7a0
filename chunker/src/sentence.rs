//! Sentence boundary detection with abbreviation handling (§4.2 step 4).

/// Tokens after which a trailing `.` never ends a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "inc", "etc", "vs", "sr", "jr", "st", "co", "ltd", "fig",
    "approx", "dept", "e.g", "i.e",
];

/// Splits `text` into sentences, never breaking after an abbreviation.
///
/// This is a heuristic splitter, not a full sentence tokenizer: it treats
/// `.`, `!`, `?` followed by whitespace (or end of text) as a boundary,
/// unless the word immediately preceding the punctuation is a known
/// abbreviation.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let ch = text[i..].chars().next().unwrap();
        let ch_len = ch.len_utf8();

        if matches!(ch, '.' | '!' | '?') {
            let end = i + ch_len;
            let next_is_boundary = text[end..]
                .chars()
                .next()
                .map(char::is_whitespace)
                .unwrap_or(true);

            if next_is_boundary && !ends_in_abbreviation(&text[start..i]) {
                let candidate = text[start..end].trim();
                if !candidate.is_empty() {
                    sentences.push(candidate);
                }
                start = end;
            }
        }
        i += ch_len;
    }

    if start < text.len() {
        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }

    sentences
}

fn ends_in_abbreviation(prefix: &str) -> bool {
    let word = prefix
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    !word.is_empty() && ABBREVIATIONS.contains(&word.as_str())
}

/// Finds the byte offset right after the last sentence-ending boundary
/// (`.`, `!`, `?` followed by whitespace) within `window`, for use as an
/// overlap cut point. Returns `None` if no boundary is found.
#[must_use]
pub fn last_sentence_boundary(window: &str) -> Option<usize> {
    let sentences = split_sentences(window);
    if sentences.len() < 2 {
        return None;
    }
    // Every sentence but the last is fully contained in `window`; the cut
    // point is where the last complete sentence ends.
    let consumed: usize = sentences[..sentences.len() - 1]
        .iter()
        .map(|s| window.find(s).map_or(0, |pos| pos + s.len()))
        .max()
        .unwrap_or(0);
    if consumed == 0 || consumed >= window.len() {
        None
    } else {
        Some(consumed)
    }
}
