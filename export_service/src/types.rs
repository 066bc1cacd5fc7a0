//! Shared export types: formats, the `export_jobs` lifecycle record, and
//! the ZIP manifest shape (§4.10, §6 persisted state layout).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
    Markdown,
    Html,
    Zip,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
            ExportFormat::Zip => "zip",
        }
    }

    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            "markdown" | "md" => Some(ExportFormat::Markdown),
            "html" => Some(ExportFormat::Html),
            "zip" => Some(ExportFormat::Zip),
            "txt" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// One file bundled into a ZIP export (§4.10 "manifest that enumerates
/// each included file with size, format, and record count").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub format: ExportFormat,
    pub size_bytes: u64,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub files: Vec<ManifestEntry>,
}

/// The `export_jobs` relational row (§6 persisted state layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: String,
    pub requested_by: String,
    pub format: ExportFormat,
    pub file_path: String,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
}

impl ExportJob {
    #[must_use]
    pub fn new(requested_by: impl Into<String>, format: ExportFormat, file_path: impl Into<String>, record_count: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            requested_by: requested_by.into(),
            format,
            file_path: file_path.into(),
            record_count,
            created_at: Utc::now(),
        }
    }
}
