//! `ticket_csv` parser (§4.1): one row → one document.

use crate::dates::parse_flexible_date;
use crate::error::{ParseError, ParseWarning};
use crate::types::ParsedDocument;
use std::collections::HashMap;

/// Canonical field names a recognized column header maps to.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("id", &["id", "ticket_id", "key", "issue_id", "issue_key"]),
    ("summary", &["summary", "title"]),
    ("description", &["description", "desc", "body"]),
    ("comments", &["comments", "comment"]),
    ("reporter", &["reporter", "author", "created_by"]),
    ("status", &["status", "state"]),
    ("priority", &["priority"]),
    ("labels", &["labels", "tags"]),
    ("components", &["components", "component"]),
    ("created", &["created", "created_at", "date", "opened"]),
];

fn canonical_for(header: &str) -> Option<&'static str> {
    let lower = header.trim().to_lowercase();
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&lower.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Parses a ticket CSV export into one `ParsedDocument` per row.
///
/// Malformed CSV (unterminated quote, wrong field count with `flexible`
/// disabled, etc.) fails the whole job per the parser contract; a row
/// missing both `id` and `summary` is skipped with a warning instead.
pub fn parse(bytes: &[u8]) -> Result<(Vec<ParsedDocument>, Vec<ParseWarning>), ParseError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let header_map: Vec<Option<&'static str>> = reader
        .headers()?
        .iter()
        .map(canonical_for)
        .collect::<Vec<_>>();

    let mut documents = Vec::new();
    let mut warnings = Vec::new();

    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let mut fields: HashMap<&'static str, String> = HashMap::new();
        for (col, value) in header_map.iter().zip(record.iter()) {
            if let Some(canonical) = col {
                if !value.trim().is_empty() {
                    fields.insert(canonical, value.to_string());
                }
            }
        }

        let id = fields.get("id").cloned();
        let summary = fields.get("summary").cloned();
        let (id, summary) = match (id, summary) {
            (Some(id), Some(summary)) => (id, summary),
            _ => {
                warnings.push(ParseWarning::new(format!(
                    "row {} missing id or summary, skipped",
                    row_index + 1
                )));
                continue;
            }
        };

        let mut content = String::new();
        if let Some(desc) = fields.get("description") {
            content.push_str(desc);
            content.push('\n');
        }
        if let Some(comments) = fields.get("comments") {
            content.push_str("\n--- comments ---\n");
            content.push_str(comments);
        }

        let mut metadata = serde_json::Map::new();
        metadata.insert("ticket_id".into(), serde_json::Value::String(id));
        for key in ["status", "priority", "labels", "components"] {
            if let Some(value) = fields.get(key) {
                metadata.insert(key.into(), serde_json::Value::String(value.clone()));
            }
        }

        let created_at = fields.get("created").and_then(|raw| {
            let parsed = parse_flexible_date(raw);
            if parsed.is_none() {
                warnings.push(ParseWarning::new(format!(
                    "row {}: could not parse date {raw:?}, left null",
                    row_index + 1
                )));
            }
            parsed
        });

        let mut doc = ParsedDocument::new(summary, content.trim().to_string())
            .with_metadata(serde_json::Value::Object(metadata));
        if let Some(reporter) = fields.get("reporter") {
            doc = doc.with_author(reporter.clone());
        }
        if let Some(created_at) = created_at {
            doc = doc.with_created_at(created_at);
        }
        documents.push(doc);
    }

    Ok((documents, warnings))
}
