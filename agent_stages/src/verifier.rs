//! Verifier stage (§4.8): runs consistency/quality checks over upstream
//! outputs and derives a deterministic `approval_status`.

use serde::{Deserialize, Serialize};

use crate::collaborators::{complete_and_parse, LlmProvider};
use crate::envelope::{Envelope, StageKind};
use crate::error::StageError;
use crate::synthesizer::AnalysisDocument;
use crate::taskmaster::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Accuracy,
    Feasibility,
    Compliance,
    Completeness,
    Clarity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub category: CheckCategory,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    NeedsReview,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierPayload {
    pub verification_checks: Vec<Check>,
    pub consistency_checks: Vec<Check>,
    pub overall_validation: OverallValidation,
    pub recommendations: Vec<String>,
    pub flagged_issues: Vec<String>,
    pub approval_status: ApprovalStatus,
}

#[derive(Debug, Clone)]
pub struct VerifierInput {
    pub request_id: String,
    pub to_be_document: Option<AnalysisDocument>,
    pub tasks: Vec<Task>,
}

/// Raw checks plus an overall score, as returned by the LLM before this
/// function derives `approval_status` deterministically (§4.8
/// "`approval_status` derives deterministically from the check results").
#[derive(Debug, Clone, Deserialize)]
struct RawVerifierResponse {
    verification_checks: Vec<Check>,
    consistency_checks: Vec<Check>,
    errors: Vec<String>,
    warnings: Vec<String>,
    score: f32,
    recommendations: Vec<String>,
    flagged_issues: Vec<String>,
}

pub async fn run(input: &VerifierInput, provider: &dyn LlmProvider) -> Result<Envelope<VerifierPayload>, StageError> {
    let system_prompt = "You are the Verifier stage of an analyst-copilot workflow. Evaluate the \
        future-state document and generated tasks for accuracy, feasibility, compliance, and \
        completeness. Respond with structured JSON listing verification_checks, \
        consistency_checks, errors, warnings, an overall score in [0,1], recommendations, and \
        flagged_issues. Do not compute an approval status yourself.";
    let user_prompt = build_user_prompt(input);

    let raw = complete_and_parse(provider, system_prompt, &user_prompt, parse_raw).await?;
    let approval_status = derive_approval_status(&raw.verification_checks, raw.score);
    let valid = approval_status == ApprovalStatus::Approved;

    let payload = VerifierPayload {
        verification_checks: raw.verification_checks,
        consistency_checks: raw.consistency_checks,
        overall_validation: OverallValidation {
            valid,
            errors: raw.errors,
            warnings: raw.warnings,
            score: raw.score,
        },
        recommendations: raw.recommendations,
        flagged_issues: raw.flagged_issues,
        approval_status,
    };
    let confidence = payload.overall_validation.score.clamp(0.0, 1.0);
    let reasoning = format!("approval_status={:?} derived from score={:.2}", approval_status, payload.overall_validation.score);
    Ok(Envelope::new(StageKind::Verifier, input.request_id.clone(), confidence, reasoning, payload))
}

fn build_user_prompt(input: &VerifierInput) -> String {
    let mut prompt = String::new();
    if let Some(doc) = &input.to_be_document {
        prompt.push_str(&format!("Future-state document: {}\n{}\n\n", doc.title, doc.executive_summary));
    }
    prompt.push_str(&format!("{} task(s) to validate:\n", input.tasks.len()));
    for task in &input.tasks {
        prompt.push_str(&format!("- {}: {}\n", task.title, task.description));
    }
    prompt
}

fn parse_raw(raw: &str) -> Result<RawVerifierResponse, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

/// §4.8: "any failing check in categories {accuracy, feasibility,
/// compliance} → rejected; otherwise approved if overall score ≥ 0.8,
/// needs_review 0.6–0.8, rejected below."
fn derive_approval_status(checks: &[Check], score: f32) -> ApprovalStatus {
    let gating_failure = checks.iter().any(|check| {
        !check.passed
            && matches!(
                check.category,
                CheckCategory::Accuracy | CheckCategory::Feasibility | CheckCategory::Compliance
            )
    });
    if gating_failure {
        return ApprovalStatus::Rejected;
    }
    if score >= 0.8 {
        ApprovalStatus::Approved
    } else if score >= 0.6 {
        ApprovalStatus::NeedsReview
    } else {
        ApprovalStatus::Rejected
    }
}
