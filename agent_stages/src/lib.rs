//! Clarifier, Synthesizer, Taskmaster, and Verifier stage contracts
//! (§4.8), sharing a common tagged-variant output envelope (§3
//! `StageOutput`, design note §9).
//!
//! Each stage is a plain async function `(stage_input, &dyn LlmProvider)
//! -> Result<Envelope<Payload>, StageError>` — deliberately not coupled
//! to `workflow_engine::node::Node`. The workflow engine crate has no
//! knowledge of these domain types; `acp_core` adapts each stage function
//! into a `Node` impl and wires the five stage graphs (§4.7) over them.

pub mod clarifier;
pub mod collaborators;
pub mod envelope;
pub mod error;
pub mod synthesizer;
pub mod taskmaster;
pub mod verifier;

pub mod prelude {
    pub use crate::clarifier::{self, ClarifierInput, ClarifierPayload, ClarifierQuestion, Importance, QuestionKind};
    pub use crate::collaborators::{complete_and_parse, LlmProvider};
    pub use crate::envelope::{ConfidenceBand, Envelope, StageKind, StageOutput};
    pub use crate::error::{LlmError, StageError};
    pub use crate::synthesizer::{self, AnalysisDocument, DocumentSection, RiskItem, SynthesizerInput, SynthesizerPayload};
    pub use crate::taskmaster::{self, Task, TaskmasterInput, TaskmasterPayload};
    pub use crate::verifier::{self, ApprovalStatus, Check, CheckCategory, OverallValidation, VerifierInput, VerifierPayload};
}
