//! Shared workflow types (§3 `WorkflowExecution`, §4.7).
//!
//! These are the typed state the engine module drives; none of it is
//! known to `workflow_engine` itself — that crate only sees
//! [`crate::workflow::nodes`] adapters over [`serde_json::Value`] extras.

use std::collections::HashMap;

use agent_stages::prelude::StageOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Full,
    ClarificationOnly,
    SynthesisOnly,
    TaskGeneration,
    VerificationOnly,
}

impl WorkflowType {
    /// The stage names this workflow type's graph visits, in topological
    /// order (§4.7 graph definitions). `retrieve_context` precedes
    /// `clarifier` wherever `clarifier` appears.
    #[must_use]
    pub fn stages(self) -> &'static [&'static str] {
        match self {
            WorkflowType::Full => &["retrieve_context", "clarifier", "synthesizer", "taskmaster", "verifier"],
            WorkflowType::ClarificationOnly => &["retrieve_context", "clarifier"],
            WorkflowType::SynthesisOnly => &["synthesizer"],
            WorkflowType::TaskGeneration => &["retrieve_context", "clarifier", "synthesizer", "taskmaster"],
            WorkflowType::VerificationOnly => &["verifier"],
        }
    }

    /// Whether this workflow type's graph includes the clarifier's
    /// suspend point (§4.7 "Conditional edge after clarifier").
    #[must_use]
    pub fn has_clarifier(self) -> bool {
        self.stages().contains(&"clarifier")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    WaitingForInput,
    Completed,
    Failed,
    Cancelled,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// One entry of [`WorkflowExecution::steps`] (§3 `WorkflowStep`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub stage: String,
    pub status: StepStatus,
    pub input: Option<serde_json::Value>,
    pub output: Option<serde_json::Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WorkflowStep {
    #[must_use]
    pub fn pending(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StepStatus::Pending,
            input: None,
            output: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Shared typed state threaded through a workflow's stages (§3
/// `WorkflowExecution.scoped WorkflowContext`). `shared_data` carries
/// whatever a downstream stage needs from an upstream one — retrieved
/// knowledge, clarifier answers, the synthesizer's `to_be_document` — so
/// a stage's input is always built from this plus its own prior output
/// (§4.7 "Build stage input from `WorkflowContext.shared_data`").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowContext {
    pub shared_data: HashMap<String, serde_json::Value>,
}

impl WorkflowContext {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.shared_data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.shared_data.insert(key.into(), value);
    }
}

/// One invocation of the agent pipeline (§3 `WorkflowExecution`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_type: WorkflowType,
    pub status: WorkflowStatus,
    pub user_id: String,
    pub original_request: String,
    pub context: WorkflowContext,
    pub steps: Vec<WorkflowStep>,
    pub current_step: usize,
    pub results: HashMap<String, StageOutput>,
    pub error_message: Option<String>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    #[must_use]
    pub fn new(id: impl Into<String>, workflow_type: WorkflowType, user_id: impl Into<String>, original_request: impl Into<String>, priority: Priority) -> Self {
        let steps = workflow_type.stages().iter().map(|s| WorkflowStep::pending(*s)).collect();
        Self {
            id: id.into(),
            workflow_type,
            status: WorkflowStatus::Pending,
            user_id: user_id.into(),
            original_request: original_request.into(),
            context: WorkflowContext::default(),
            steps,
            current_step: 0,
            results: HashMap::new(),
            error_message: None,
            priority,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled | WorkflowStatus::Timeout
        )
    }
}
