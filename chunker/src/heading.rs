//! Markdown heading detection (§4.2 step 2).

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)[ \t]*$").unwrap());

/// A detected heading line: `(byte_offset_of_line_start, level, title)`.
#[derive(Debug, Clone)]
pub struct Heading {
    pub offset: usize,
    pub level: u8,
    pub title: String,
}

/// Scans `text` for Markdown `#`..`######` heading lines, in order.
#[must_use]
pub fn find_headings(text: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            let level = caps[1].len() as u8;
            let title = caps[2].trim().to_string();
            Heading {
                offset: whole.start(),
                level,
                title,
            }
        })
        .collect()
}

/// Returns `true` if `line` is itself a heading line, for per-chunk
/// `contains_headings` detection.
#[must_use]
pub fn is_heading_line(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_headings_with_levels() {
        let text = "# Title\n\nIntro text.\n\n## Section One\n\nBody.\n\n### Subsection\n\nMore.";
        let headings = find_headings(text);
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].title, "Title");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].title, "Section One");
        assert_eq!(headings[2].level, 3);
    }

    #[test]
    fn ignores_hash_not_followed_by_space() {
        assert!(find_headings("#no-space-heading").is_empty());
    }
}
