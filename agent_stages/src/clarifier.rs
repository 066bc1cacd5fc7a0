//! Clarifier stage (§4.8): turns an ambiguous user request into a set of
//! clarifying questions plus a confidence estimate of how well-specified
//! the request already is.

use serde::{Deserialize, Serialize};

use crate::collaborators::{complete_and_parse, LlmProvider};
use crate::envelope::{Envelope, StageKind};
use crate::error::StageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Requirement,
    Constraint,
    Scope,
    Stakeholder,
    Technical,
    Business,
    Timeline,
    Integration,
    Data,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifierQuestion {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    pub importance: Importance,
    pub suggested_answers: Option<Vec<String>>,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarifierPayload {
    pub questions: Vec<ClarifierQuestion>,
    pub analysis_summary: String,
    pub identified_gaps: Vec<String>,
    pub assumptions: Vec<String>,
}

/// Input built from `WorkflowContext.shared_data` plus the `retrieve_context`
/// step's output (§4.7 "Build stage input from shared_data plus prior step
/// outputs").
#[derive(Debug, Clone)]
pub struct ClarifierInput {
    pub request_id: String,
    pub user_request: String,
    /// Retrieved knowledge snippets (search service hits' `text`).
    pub knowledge_context: Vec<String>,
    /// Caller-visible domain tag, when one was supplied with the request.
    pub domain_context: Option<String>,
    /// Upper bound on the number of questions this stage should ask.
    pub max_questions: usize,
}

impl ClarifierInput {
    #[must_use]
    pub fn new(request_id: impl Into<String>, user_request: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user_request: user_request.into(),
            knowledge_context: Vec::new(),
            domain_context: None,
            max_questions: 6,
        }
    }
}

/// Runs the Clarifier stage against `input`, invoking `provider` with the
/// stage's system prompt and parsing its structured response.
pub async fn run(
    input: &ClarifierInput,
    provider: &dyn LlmProvider,
) -> Result<Envelope<ClarifierPayload>, StageError> {
    let system_prompt = "You are the Clarifier stage of an analyst-copilot workflow. Given a \
        user request and retrieved knowledge context, identify ambiguities and emit clarifying \
        questions as structured JSON matching the ClarifierPayload schema.";
    let user_prompt = build_user_prompt(input);

    let payload = complete_and_parse(provider, system_prompt, &user_prompt, parse_payload).await?;
    let confidence = estimate_confidence(input, &payload);
    let reasoning = format!(
        "clarity/context/question-ratio/domain blend over {} question(s)",
        payload.questions.len()
    );
    Ok(Envelope::new(StageKind::Clarifier, input.request_id.clone(), confidence, reasoning, payload))
}

fn build_user_prompt(input: &ClarifierInput) -> String {
    let mut prompt = format!("User request:\n{}\n\n", input.user_request);
    if !input.knowledge_context.is_empty() {
        prompt.push_str("Retrieved context:\n");
        for snippet in &input.knowledge_context {
            prompt.push_str("- ");
            prompt.push_str(snippet);
            prompt.push('\n');
        }
    }
    prompt.push_str(&format!("\nAsk at most {} clarifying questions.", input.max_questions));
    prompt
}

fn parse_payload(raw: &str) -> Result<ClarifierPayload, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

/// Weighted blend of four heuristics (§4.8 "Confidence = weighted blend
/// of request-clarity heuristic, knowledge-context availability, question
/// count vs configured maximum, and domain-context presence"). Weights
/// are a design decision recorded in `DESIGN.md`.
fn estimate_confidence(input: &ClarifierInput, payload: &ClarifierPayload) -> f32 {
    let word_count = input.user_request.split_whitespace().count() as f32;
    let clarity = (word_count / 15.0).min(1.0);

    let knowledge = if input.knowledge_context.is_empty() {
        0.2
    } else {
        (input.knowledge_context.len() as f32 / 5.0).min(1.0)
    };

    let max_questions = input.max_questions.max(1) as f32;
    let question_completeness = 1.0 - (payload.questions.len() as f32 / max_questions).min(1.0);

    let domain = if input.domain_context.is_some() { 1.0 } else { 0.5 };

    0.3 * clarity + 0.3 * knowledge + 0.2 * question_completeness + 0.2 * domain
}
