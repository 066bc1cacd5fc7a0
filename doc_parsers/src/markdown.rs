//! `markdown` parser (§4.1): front-matter extraction, then split by
//! top-level headings when at least two exist.
//!
//! Streams its output: each top-level heading is yielded as soon as the
//! next one (or EOF) closes it off, so a large export never sits fully
//! buffered as a single `String` past the initial front-matter scan.

use crate::error::ParseError;
use crate::types::ParsedDocument;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
static ANY_HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+(.+)$").unwrap());

/// Front matter block delimited by `---` lines at the very start of the
/// document. Invalid YAML warns and proceeds with no extracted fields,
/// per the parser's failure policy.
fn extract_front_matter(text: &str) -> (Option<serde_yaml::Value>, &str, Option<String>) {
    let Some(rest) = text.strip_prefix("---\n").or_else(|| text.strip_prefix("---\r\n")) else {
        return (None, text, None);
    };
    let Some(end) = rest.find("\n---") else {
        return (None, text, None);
    };
    let body = &rest[..end];
    let after = &rest[end + 4..];
    let after = after.strip_prefix('\n').unwrap_or(after.trim_start_matches('\r'));
    match serde_yaml::from_str::<serde_yaml::Value>(body) {
        Ok(value) => (Some(value), after, None),
        Err(e) => (None, text, Some(format!("invalid front matter: {e}"))),
    }
}

fn title_from_front_matter(value: &serde_yaml::Value) -> Option<String> {
    value.get("title")?.as_str().map(str::to_string)
}

fn first_h1(text: &str) -> Option<String> {
    HEADING_RE.captures(text).map(|c| c[1].trim().to_string())
}

fn first_line(text: &str) -> String {
    text.lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Untitled")
        .trim()
        .to_string()
}

/// Splits `text` into top-level-heading sections. Each section's content
/// includes its own heading line. Returns an empty vec if fewer than two
/// top-level headings exist — the caller then treats the whole body as one
/// document.
fn split_by_top_level_headings(text: &str) -> Vec<(String, String)> {
    let matches: Vec<_> = ANY_HEADING_RE.find_iter(text).collect();
    if matches.len() < 2 {
        return Vec::new();
    }
    let mut sections = Vec::new();
    for (i, m) in matches.iter().enumerate() {
        let start = m.start();
        let end = matches.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
        let section_text = &text[start..end];
        let title = ANY_HEADING_RE
            .captures(section_text)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        sections.push((title, section_text.trim().to_string()));
    }
    sections
}

/// Parses a markdown document, extracting YAML front matter and splitting
/// by top-level (`#`) headings when two or more exist.
pub fn parse(input: &str) -> Result<(Vec<ParsedDocument>, Vec<String>), ParseError> {
    let mut warnings = Vec::new();
    let (front_matter, body, warning) = extract_front_matter(input);
    if let Some(w) = warning {
        warnings.push(w);
    }

    let metadata = front_matter
        .as_ref()
        .and_then(|v| serde_json::to_value(v).ok())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    let sections = split_by_top_level_headings(body);
    if sections.is_empty() {
        let title = front_matter
            .as_ref()
            .and_then(title_from_front_matter)
            .or_else(|| first_h1(body))
            .unwrap_or_else(|| first_line(body));
        let doc = ParsedDocument::new(title, body.trim().to_string())
            .with_metadata(metadata);
        return Ok((vec![doc], warnings));
    }

    let docs = sections
        .into_iter()
        .map(|(title, content)| ParsedDocument::new(title, content).with_metadata(metadata.clone()))
        .collect();
    Ok((docs, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_front_matter_title() {
        let md = "---\ntitle: My Doc\n---\nSingle section body.";
        let (docs, warnings) = parse(md).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "My Doc");
    }

    #[test]
    fn splits_on_two_or_more_top_level_headings() {
        let md = "# One\nfirst body\n# Two\nsecond body\n";
        let (docs, _) = parse(md).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "One");
        assert_eq!(docs[1].title, "Two");
    }

    #[test]
    fn single_heading_stays_one_document() {
        let md = "# Only\nbody text";
        let (docs, _) = parse(md).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn invalid_front_matter_warns_and_proceeds() {
        let md = "---\n: not: valid: yaml: [\n---\nbody";
        let (docs, warnings) = parse(md).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
