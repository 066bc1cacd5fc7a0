//! Parser failure modes (§4.1 "Failure policy" column).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no parser registered for source type {0:?}")]
    UnsupportedSourceType(String),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid HTML: {0}")]
    InvalidHtml(String),

    #[error("XML rejected: document declares a DTD or entity ({0}); entity expansion is disabled")]
    XmlSecurity(String),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("PDF header invalid or file is corrupt: {0}")]
    Pdf(String),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("entry {0:?} escapes the extraction root (path traversal)")]
    PathTraversal(String),

    #[error("database introspection failed: {0}")]
    DbSchema(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid parser input: {0}")]
    InvalidInput(String),
}

/// A non-fatal issue surfaced alongside an otherwise-successful parse, e.g.
/// "row 12 missing id, skipped" or "front-matter invalid, proceeding".
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub message: String,
}

impl ParseWarning {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
