//! `paste` parser (§4.1): always exactly one document, caller-supplied title.

use crate::types::ParsedDocument;

#[must_use]
pub fn parse(text: &str, title: impl Into<String>, metadata: serde_json::Value) -> ParsedDocument {
    ParsedDocument::new(title.into(), text.to_string()).with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_single_document_with_caller_title() {
        let doc = parse("pasted body", "Ad-hoc note", serde_json::json!({"origin": "acme"}));
        assert_eq!(doc.title, "Ad-hoc note");
        assert_eq!(doc.content, "pasted body");
        assert_eq!(doc.metadata["origin"], "acme");
    }
}
