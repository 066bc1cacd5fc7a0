//! Public façade: `detect` and `process` (§4.3 Operations).

use std::sync::Arc;

use crate::config::{PiiPolicy, RedactionMode};
use crate::entities::EntityMatch;
use crate::error::PiiError;
use crate::pipeline::{DetectionLayer, PipelineExecutor, RegexLayer};
use crate::redact::Redactor;

/// Entry point combining the detection pipeline and the redactor.
pub struct PiiDetector {
    policy: PiiPolicy,
    executor: PipelineExecutor,
    redactor: Redactor,
}

impl PiiDetector {
    /// Builds a detector from `policy`, compiling the built-in catalog and
    /// any configured custom patterns.
    ///
    /// # Errors
    /// Returns [`PiiError::InvalidPattern`] if a custom pattern fails to compile.
    pub fn new(policy: PiiPolicy) -> Result<Self, PiiError> {
        Self::with_extra_layers(policy, Vec::new())
    }

    /// Like [`Self::new`] but allows registering additional layers, such as
    /// an NER provider, ahead of the built-in regex layer's priority.
    pub fn with_extra_layers(
        policy: PiiPolicy,
        extra: Vec<Arc<dyn DetectionLayer>>,
    ) -> Result<Self, PiiError> {
        let mut layers: Vec<Arc<dyn DetectionLayer>> =
            vec![Arc::new(RegexLayer::new(&policy.custom_patterns)?)];
        layers.extend(extra);

        let executor = PipelineExecutor::new(layers, policy.fail_mode, policy.min_confidence);
        Ok(Self {
            policy,
            executor,
            redactor: Redactor::new(),
        })
    }

    /// Detect entities without mutating the input (§4.3 `detect`).
    ///
    /// # Errors
    /// Propagates pipeline layer failures per the configured fail mode.
    pub async fn detect(&self, text: &str) -> Result<Vec<EntityMatch>, PiiError> {
        Ok(self.executor.run(text).await?.matches)
    }

    /// Detect and transform per `mode` (§4.3 `process`).
    ///
    /// `process` is idempotent for [`RedactionMode::Redact`] and
    /// [`RedactionMode::Mask`]; for [`RedactionMode::Pseudonymize`], running
    /// it twice in the same session yields identical output because the
    /// redactor's mapping is keyed by entity type and original value.
    ///
    /// # Errors
    /// Propagates pipeline layer failures per the configured fail mode.
    pub async fn process(&self, text: &str, mode: RedactionMode) -> Result<String, PiiError> {
        let result = self.executor.run(text).await?;
        Ok(self.redactor.apply(text, &result.matches, mode))
    }

    /// Process using the policy's configured default mode.
    ///
    /// # Errors
    /// Propagates pipeline layer failures per the configured fail mode.
    pub async fn process_default(&self, text: &str) -> Result<String, PiiError> {
        self.process(text, self.policy.default_mode).await
    }

    pub fn clear_pseudonym_mappings(&self) {
        self.redactor.clear_pseudonym_mappings();
    }

    #[must_use]
    pub fn get_pseudonym_mappings(&self) -> rustc_hash::FxHashMap<String, String> {
        self.redactor.get_pseudonym_mappings()
    }

    #[must_use]
    pub fn policy(&self) -> &PiiPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_redact_is_idempotent() {
        let detector = PiiDetector::new(PiiPolicy::default()).unwrap();
        let text = "contact jane@example.com";
        let once = detector.process(text, RedactionMode::Redact).await.unwrap();
        let twice = detector.process(&once, RedactionMode::Redact).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn process_pseudonymize_twice_same_session_matches() {
        let detector = PiiDetector::new(PiiPolicy::default()).unwrap();
        let text = "contact jane@example.com";
        let first = detector
            .process(text, RedactionMode::Pseudonymize)
            .await
            .unwrap();
        let second = detector
            .process(text, RedactionMode::Pseudonymize)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn detect_does_not_mutate_input() {
        let detector = PiiDetector::new(PiiPolicy::default()).unwrap();
        let text = "contact jane@example.com";
        let matches = detector.detect(text).await.unwrap();
        assert!(!matches.is_empty());
    }
}
