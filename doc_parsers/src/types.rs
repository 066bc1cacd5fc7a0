//! The common unit every parser produces (§4.1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One extracted document, ready for PII processing and chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl ParsedDocument {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            author: None,
            created_at: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Recognized source types (§4.1). `Unknown` is returned by `detect` when
/// neither extension nor MIME type match a registered parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    TicketCsv,
    WikiHtml,
    WikiXml,
    Pdf,
    Markdown,
    Paste,
    Code,
    DbSchema,
    Zip,
    Unknown,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::TicketCsv => "ticket_csv",
            SourceType::WikiHtml => "wiki_html",
            SourceType::WikiXml => "wiki_xml",
            SourceType::Pdf => "pdf",
            SourceType::Markdown => "markdown",
            SourceType::Paste => "paste",
            SourceType::Code => "code",
            SourceType::DbSchema => "db_schema",
            SourceType::Zip => "zip",
            SourceType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Raw input handed to a parser. Most parsers only need bytes; `db_schema`'s
/// live-introspection path instead carries a connection string.
#[derive(Debug, Clone)]
pub enum ParserInput {
    Bytes(Vec<u8>),
    ConnectionString(String),
}

impl ParserInput {
    pub fn as_bytes(&self) -> Result<&[u8], crate::error::ParseError> {
        match self {
            ParserInput::Bytes(b) => Ok(b),
            ParserInput::ConnectionString(_) => Err(crate::error::ParseError::InvalidInput(
                "expected byte input, got a connection string".into(),
            )),
        }
    }

    pub fn as_text(&self) -> Result<&str, crate::error::ParseError> {
        let bytes = self.as_bytes()?;
        std::str::from_utf8(bytes)
            .map_err(|e| crate::error::ParseError::InvalidInput(format!("not valid UTF-8: {e}")))
    }
}

/// Outcome of a parse: the documents produced plus any non-fatal warnings
/// collected along the way (§4.1 "warn and continue" failure policies).
pub struct ParseOutcome {
    pub documents: Box<dyn Iterator<Item = ParsedDocument> + Send>,
    pub warnings: Vec<crate::error::ParseWarning>,
}

impl ParseOutcome {
    #[must_use]
    pub fn new(documents: Vec<ParsedDocument>, warnings: Vec<crate::error::ParseWarning>) -> Self {
        Self {
            documents: Box::new(documents.into_iter()),
            warnings,
        }
    }
}
