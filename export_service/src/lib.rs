//! Multi-format rendering of search and workflow results (§4.10).
//!
//! ```text
//! SearchResult[] / Task[] / AnalysisDocument ─► {csv, json, markdown, html}
//!                                                       │
//!                                              zip_export::package ─► archive + manifest
//! ```

pub mod csv_export;
pub mod error;
pub mod html_export;
pub mod json_export;
pub mod markdown_export;
pub mod sweep;
pub mod types;
pub mod zip_export;

pub mod prelude {
    pub use crate::csv_export::{search_results_to_csv, tasks_to_csv};
    pub use crate::error::ExportError;
    pub use crate::html_export::markdown_to_html;
    pub use crate::json_export::to_json;
    pub use crate::markdown_export::{document_to_markdown, tasks_to_markdown, verification_to_markdown};
    pub use crate::sweep::{spawn_sweeper, sweep_expired, DEFAULT_MAX_AGE_HOURS};
    pub use crate::types::{ExportFormat, ExportJob, Manifest, ManifestEntry};
    pub use crate::zip_export::{package, ExportFile};
}
