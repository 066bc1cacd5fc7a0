//! Policy configuration for the PII pipeline.
//!
//! Mirrors the compiled-defaults → file → env-var resolution order used
//! across this codebase's configuration layers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Errors that can occur while resolving a [`PiiPolicy`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config: {source}")]
    ParseError {
        format: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported config file format: {message}")]
    UnsupportedFormat { message: String },

    #[error("policy validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse { key: String, message: String },
}

/// Behavior when the detection pipeline itself fails (backend error, not
/// a detected entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    /// Fail the calling operation.
    Closed,
    /// Let content pass through unmodified but log the failure.
    Open,
    /// Log only; never surfaced to the caller.
    LogOnly,
}

impl Default for FailMode {
    fn default() -> Self {
        Self::Closed
    }
}

/// Transformation applied to detected entities (§4.3 Modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionMode {
    Redact,
    Pseudonymize,
    Mask,
}

impl Default for RedactionMode {
    fn default() -> Self {
        Self::Redact
    }
}

/// A caller-supplied pattern registered at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    pub regex_str: String,
    pub category: String,
}

/// Main PII detection/redaction policy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PiiPolicy {
    #[validate(length(min = 1))]
    pub version: String,
    pub enabled: bool,
    pub fail_mode: FailMode,
    pub default_mode: RedactionMode,
    /// Enable the optional NER augmentation layer, when a provider is wired.
    pub enable_ner: bool,
    pub custom_patterns: Vec<CustomPattern>,
    /// Minimum confidence for a match to be acted upon.
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_confidence: f32,
}

impl Default for PiiPolicy {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            enabled: true,
            fail_mode: FailMode::Closed,
            default_mode: RedactionMode::Redact,
            enable_ner: false,
            custom_patterns: Vec::new(),
            min_confidence: 0.5,
        }
    }
}

/// Builder for constructing a [`PiiPolicy`] from multiple sources.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    base: PiiPolicy,
    use_env: bool,
}

impl PolicyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: PiiPolicy::default(),
            use_env: false,
        }
    }

    /// Load policy from a YAML, TOML, or JSON file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let policy: PiiPolicy = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "YAML".to_string(),
                    source: Box::new(e),
                })?
            }
            Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                format: "TOML".to_string(),
                source: Box::new(e),
            })?,
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                    format: "JSON".to_string(),
                    source: Box::new(e),
                })?
            }
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    message: "file extension must be .yaml, .yml, .toml, or .json".to_string(),
                });
            }
        };

        self.base = policy;
        Ok(self)
    }

    /// Enable `PII_GUARD_*` environment variable overrides.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    /// Resolve the final policy.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if validation fails or an env var is malformed.
    pub fn build(mut self) -> Result<PiiPolicy, ConfigError> {
        if self.use_env {
            dotenvy::dotenv().ok();

            if let Ok(v) = std::env::var("PII_GUARD_ENABLED") {
                self.base.enabled = v.parse().map_err(|_| ConfigError::EnvParse {
                    key: "PII_GUARD_ENABLED".to_string(),
                    message: "must be 'true' or 'false'".to_string(),
                })?;
            }

            if let Ok(v) = std::env::var("PII_GUARD_FAIL_MODE") {
                self.base.fail_mode = match v.to_lowercase().as_str() {
                    "closed" => FailMode::Closed,
                    "open" => FailMode::Open,
                    "log_only" | "logonly" => FailMode::LogOnly,
                    _ => {
                        return Err(ConfigError::EnvParse {
                            key: "PII_GUARD_FAIL_MODE".to_string(),
                            message: "must be 'closed', 'open', or 'log_only'".to_string(),
                        });
                    }
                };
            }

            if let Ok(v) = std::env::var("PII_GUARD_MODE") {
                self.base.default_mode = match v.to_lowercase().as_str() {
                    "redact" => RedactionMode::Redact,
                    "pseudonymize" => RedactionMode::Pseudonymize,
                    "mask" => RedactionMode::Mask,
                    _ => {
                        return Err(ConfigError::EnvParse {
                            key: "PII_GUARD_MODE".to_string(),
                            message: "must be 'redact', 'pseudonymize', or 'mask'".to_string(),
                        });
                    }
                };
            }
        }

        self.base.validate()?;
        Ok(self.base)
    }
}
