//! Entity detection and redaction for documents moving through the
//! ingestion pipeline.
//!
//! ```text
//! PiiPolicy ─► PolicyBuilder ─► PiiDetector
//!                                  │
//!                                  ├─► PipelineExecutor ─► DetectionLayer(s)
//!                                  │         (regex catalog, optional NER)
//!                                  └─► Redactor (redact | pseudonymize | mask)
//! ```
//!
//! ## Quick start
//!
//! ```
//! use pii_guard::config::{PiiPolicy, RedactionMode};
//! use pii_guard::detector::PiiDetector;
//!
//! let detector = PiiDetector::new(PiiPolicy::default()).unwrap();
//! let redacted = tokio::runtime::Builder::new_current_thread()
//!     .build()
//!     .unwrap()
//!     .block_on(detector.process("contact jane@example.com", RedactionMode::Redact))
//!     .unwrap();
//! assert!(redacted.contains("[EMAIL_REDACTED]"));
//! ```

pub mod config;
pub mod detector;
pub mod entities;
pub mod error;
pub mod patterns;
pub mod pipeline;
pub mod redact;

pub mod prelude {
    pub use crate::config::{FailMode, PiiPolicy, PolicyBuilder, RedactionMode};
    pub use crate::detector::PiiDetector;
    pub use crate::entities::{EntityMatch, EntityType};
    pub use crate::error::PiiError;
    pub use crate::pipeline::DetectionLayer;
}
