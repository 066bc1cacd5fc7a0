//! Parser registry and streaming parsers (§4.1).
//!
//! ```text
//! (filename, content_type) ─► detect() ─► SourceType
//!                                              │
//! (source_type, input, metadata) ─► parse() ───┴─► iterator<ParsedDocument>
//! ```
//!
//! Every parser streams in the sense that peak memory does not grow with
//! input size beyond one page/row/file at a time; the registry itself just
//! dispatches to the right one and normalizes the `(documents, warnings)`
//! shape each underlying parser returns.

pub mod code;
pub mod dates;
pub mod db_schema;
pub mod error;
pub mod markdown;
pub mod paste;
pub mod pdf;
pub mod ticket_csv;
pub mod types;
pub mod wiki_html;
pub mod wiki_xml;
pub mod zip;

pub use error::{ParseError, ParseWarning};
pub use types::{ParseOutcome, ParsedDocument, ParserInput, SourceType};

const EXTENSION_MAP: &[(&str, SourceType)] = &[
    ("csv", SourceType::TicketCsv),
    ("html", SourceType::WikiHtml),
    ("htm", SourceType::WikiHtml),
    ("xml", SourceType::WikiXml),
    ("pdf", SourceType::Pdf),
    ("md", SourceType::Markdown),
    ("markdown", SourceType::Markdown),
    ("zip", SourceType::Zip),
    ("sql", SourceType::DbSchema),
];

const MIME_MAP: &[(&str, SourceType)] = &[
    ("text/csv", SourceType::TicketCsv),
    ("text/html", SourceType::WikiHtml),
    ("application/xml", SourceType::WikiXml),
    ("text/xml", SourceType::WikiXml),
    ("application/pdf", SourceType::Pdf),
    ("text/markdown", SourceType::Markdown),
    ("application/zip", SourceType::Zip),
    ("application/x-zip-compressed", SourceType::Zip),
];

/// Extension-first, MIME-second detection heuristic (§4.1 `detect`).
/// Returns `SourceType::Unknown` when neither matches a registered parser.
#[must_use]
pub fn detect(filename: &str, content_type: Option<&str>) -> SourceType {
    if let Some(ext) = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
    {
        if let Some((_, source_type)) = EXTENSION_MAP.iter().find(|(e, _)| *e == ext) {
            return *source_type;
        }
    }
    if let Some(content_type) = content_type {
        let base = content_type.split(';').next().unwrap_or(content_type).trim();
        if let Some((_, source_type)) = MIME_MAP.iter().find(|(m, _)| *m == base) {
            return *source_type;
        }
    }
    SourceType::Unknown
}

/// Extra, parser-specific input that doesn't fit the `(bytes, metadata)`
/// shape: a caller-supplied title for `paste`, a root directory for
/// `code`, an OCR backend for `pdf`.
#[derive(Default)]
pub struct ParseOptions<'a> {
    pub paste_title: Option<String>,
    pub code_root: Option<std::path::PathBuf>,
    pub ocr: Option<&'a dyn pdf::OcrProvider>,
}

/// Dispatches `(source_type, input, metadata)` to the registered parser,
/// normalizing every parser's `(documents, warnings)` output into a
/// [`ParseOutcome`]. Fails with `UnsupportedSourceType` for `Unknown` or
/// any type with no registered parser.
pub async fn parse(
    source_type: SourceType,
    input: ParserInput,
    metadata: serde_json::Value,
    options: ParseOptions<'_>,
) -> Result<ParseOutcome, ParseError> {
    let (documents, warnings): (Vec<ParsedDocument>, Vec<String>) = match source_type {
        SourceType::TicketCsv => {
            let (docs, warns) = ticket_csv::parse(input.as_bytes()?)?;
            (docs, warns.into_iter().map(|w| w.message).collect())
        }
        SourceType::WikiHtml => (wiki_html::parse(input.as_bytes()?)?, Vec::new()),
        SourceType::WikiXml => (wiki_xml::parse(input.as_bytes()?)?, Vec::new()),
        SourceType::Pdf => pdf::parse(input.as_bytes()?, options.ocr).await?,
        SourceType::Markdown => {
            let (docs, warns) = markdown::parse(input.as_text()?)?;
            (docs, warns)
        }
        SourceType::Paste => {
            let title = options.paste_title.unwrap_or_else(|| "Pasted text".to_string());
            (vec![paste::parse(input.as_text()?, title, metadata.clone())], Vec::new())
        }
        SourceType::Code => {
            let root = options
                .code_root
                .ok_or_else(|| ParseError::InvalidInput("code parser requires a root directory".into()))?;
            code::parse(&root)?
        }
        SourceType::DbSchema => match input {
            ParserInput::ConnectionString(conn) => (db_schema::parse_live(&conn).await?, Vec::new()),
            ParserInput::Bytes(bytes) => {
                let ddl = std::str::from_utf8(&bytes)
                    .map_err(|e| ParseError::InvalidInput(format!("not valid UTF-8: {e}")))?;
                (vec![db_schema::parse_ddl(ddl)], Vec::new())
            }
        },
        SourceType::Zip => zip::parse(input.as_bytes()?)?,
        SourceType::Unknown => return Err(ParseError::UnsupportedSourceType(format!("{source_type:?}"))),
    };

    let documents = documents
        .into_iter()
        .map(|mut doc| {
            if doc.metadata == serde_json::Value::Null || doc.metadata.as_object().is_some_and(|o| o.is_empty()) {
                doc.metadata = metadata.clone();
            }
            doc
        })
        .collect();

    Ok(ParseOutcome::new(
        documents,
        warnings.into_iter().map(ParseWarning::new).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension_first() {
        assert_eq!(detect("export.csv", Some("application/octet-stream")), SourceType::TicketCsv);
        assert_eq!(detect("page.html", None), SourceType::WikiHtml);
    }

    #[test]
    fn falls_back_to_mime_type() {
        assert_eq!(detect("noext", Some("text/markdown")), SourceType::Markdown);
    }

    #[test]
    fn unknown_when_neither_matches() {
        assert_eq!(detect("mystery.bin", Some("application/octet-stream")), SourceType::Unknown);
    }

    #[tokio::test]
    async fn dispatches_ticket_csv() {
        let csv = b"id,summary\nT-1,Title\n".to_vec();
        let outcome = parse(
            SourceType::TicketCsv,
            ParserInput::Bytes(csv),
            serde_json::json!({"origin": "acme"}),
            ParseOptions::default(),
        )
        .await
        .unwrap();
        let docs: Vec<_> = outcome.documents.collect();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn unknown_source_type_is_unsupported() {
        let err = parse(
            SourceType::Unknown,
            ParserInput::Bytes(vec![]),
            serde_json::Value::Null,
            ParseOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedSourceType(_)));
    }
}
