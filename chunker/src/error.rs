//! Error type for the chunker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunker configuration invalid: {0}")]
    InvalidConfig(String),
}
