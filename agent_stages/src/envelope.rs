//! The common stage-output envelope every agent stage shares (§3
//! `StageOutput`, design note §9 "tagged variant" resolution).
//!
//! Every stage produces an [`Envelope<P>`] carrying the fields common to
//! all stages plus a stage-specific payload `P`. [`StageOutput`] wraps the
//! four concrete payload types in a single `serde`-tagged enum so a
//! workflow's `results` map can hold heterogeneous stage outputs without
//! losing which stage produced which.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clarifier::ClarifierPayload;
use crate::synthesizer::SynthesizerPayload;
use crate::taskmaster::TaskmasterPayload;
use crate::verifier::VerifierPayload;

/// Which stage produced an [`Envelope`] (§3 `stage_kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Clarifier,
    Synthesizer,
    Taskmaster,
    Verifier,
}

/// Coarse bucket derived from [`Envelope::confidence`] (§3
/// `confidence_band`). Thresholds are a design decision recorded in
/// `DESIGN.md`: below 0.4 is `Low`, below 0.75 is `Medium`, otherwise `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    #[must_use]
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence < 0.4 {
            ConfidenceBand::Low
        } else if confidence < 0.75 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::High
        }
    }
}

/// Fields every stage output carries, independent of its payload (§3
/// `StageOutput`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub stage_kind: StageKind,
    pub request_id: String,
    pub confidence: f32,
    pub confidence_band: ConfidenceBand,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
    pub payload: P,
}

impl<P> Envelope<P> {
    #[must_use]
    pub fn new(
        stage_kind: StageKind,
        request_id: impl Into<String>,
        confidence: f32,
        reasoning: impl Into<String>,
        payload: P,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            stage_kind,
            request_id: request_id.into(),
            confidence,
            confidence_band: ConfidenceBand::from_confidence(confidence),
            reasoning: reasoning.into(),
            generated_at: Utc::now(),
            payload,
        }
    }
}

/// A stage output, tagged by which stage produced it — the "tagged
/// variant" resolution to the dynamic-typing design note (§9). Downstream
/// code (the workflow engine's `results` map, the export service) matches
/// on this enum rather than juggling `serde_json::Value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage_kind", rename_all = "snake_case")]
pub enum StageOutput {
    Clarifier(Envelope<ClarifierPayload>),
    Synthesizer(Envelope<SynthesizerPayload>),
    Taskmaster(Envelope<TaskmasterPayload>),
    Verifier(Envelope<VerifierPayload>),
}

impl StageOutput {
    #[must_use]
    pub fn stage_kind(&self) -> StageKind {
        match self {
            StageOutput::Clarifier(_) => StageKind::Clarifier,
            StageOutput::Synthesizer(_) => StageKind::Synthesizer,
            StageOutput::Taskmaster(_) => StageKind::Taskmaster,
            StageOutput::Verifier(_) => StageKind::Verifier,
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f32 {
        match self {
            StageOutput::Clarifier(e) => e.confidence,
            StageOutput::Synthesizer(e) => e.confidence,
            StageOutput::Taskmaster(e) => e.confidence,
            StageOutput::Verifier(e) => e.confidence,
        }
    }
}
