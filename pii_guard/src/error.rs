//! Error taxonomy for the PII pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PiiError {
    #[error("pattern {0} is not a valid regex: {1}")]
    InvalidPattern(String, String),

    #[error("detection pipeline failed: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
