//! Export failure modes (§7 taxonomy, scoped to rendering).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("nothing to export")]
    Empty,
}
