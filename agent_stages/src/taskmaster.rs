//! Taskmaster stage (§4.8): turns the Synthesizer's `to_be_document` into
//! developer-ready tasks. Rejects its input if that document is missing.

use serde::{Deserialize, Serialize};

use crate::collaborators::{complete_and_parse, LlmProvider};
use crate::envelope::{Envelope, StageKind};
use crate::error::StageError;
use crate::synthesizer::AnalysisDocument;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_stories: Vec<String>,
    pub technical_notes: Vec<String>,
    pub estimated_effort: String,
    pub priority: String,
    pub dependencies: Vec<String>,
    pub labels: Vec<String>,
    pub epic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskmasterPayload {
    pub tasks: Vec<Task>,
    pub task_breakdown_summary: String,
    pub implementation_phases: Vec<String>,
    pub resource_requirements: String,
    pub timeline_estimate: String,
}

#[derive(Debug, Clone)]
pub struct TaskmasterInput {
    pub request_id: String,
    /// The Synthesizer's `to_be_document`; `None` means the prerequisite
    /// was never produced (§4.8 "rejects input if missing").
    pub to_be_document: Option<AnalysisDocument>,
    pub implementation_approach: String,
}

pub async fn run(
    input: &TaskmasterInput,
    provider: &dyn LlmProvider,
) -> Result<Envelope<TaskmasterPayload>, StageError> {
    // Missing prerequisites are permanent failures (§4.7 "Permanent errors
    // (schema mismatch, missing prerequisite) fail the workflow
    // immediately"), surfaced distinctly from LLM/schema errors.
    let to_be = input
        .to_be_document
        .as_ref()
        .ok_or(StageError::MissingPrerequisite(TaskmasterError::MissingToBeDocument.to_string()))?;

    let system_prompt = "You are the Taskmaster stage of an analyst-copilot workflow. Break the \
        future-state document into developer-ready tasks as structured JSON matching the \
        TaskmasterPayload schema.";
    let user_prompt = build_user_prompt(to_be, &input.implementation_approach);

    let payload = complete_and_parse(provider, system_prompt, &user_prompt, parse_payload).await?;
    let confidence = estimate_confidence(&payload);
    let reasoning = format!("decomposed {} section(s) into {} task(s)", to_be.sections.len(), payload.tasks.len());
    Ok(Envelope::new(StageKind::Taskmaster, input.request_id.clone(), confidence, reasoning, payload))
}

fn build_user_prompt(to_be: &AnalysisDocument, implementation_approach: &str) -> String {
    let mut prompt = format!("Future-state document: {}\n{}\n\n", to_be.title, to_be.executive_summary);
    for section in &to_be.sections {
        prompt.push_str(&format!("## {}\n{}\n\n", section.title, section.content));
    }
    prompt.push_str(&format!("Implementation approach:\n{implementation_approach}\n"));
    prompt
}

fn parse_payload(raw: &str) -> Result<TaskmasterPayload, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

fn estimate_confidence(payload: &TaskmasterPayload) -> f32 {
    if payload.tasks.is_empty() {
        0.1
    } else {
        let has_estimates = payload.tasks.iter().all(|t| !t.estimated_effort.is_empty());
        if has_estimates {
            0.85
        } else {
            0.6
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskmasterError {
    #[error("taskmaster requires the synthesizer's to_be_document, which was not produced")]
    MissingToBeDocument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::synthesizer::DocumentSection;
    use async_trait::async_trait;

    struct StubProvider(String);

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    fn sample_to_be() -> AnalysisDocument {
        AnalysisDocument {
            title: "Future State".into(),
            executive_summary: "Automated workflow".into(),
            sections: vec![DocumentSection {
                id: "s1".into(),
                title: "Approval routing".into(),
                content: "...".into(),
                kind: "overview".into(),
                order: 1,
            }],
        }
    }

    fn sample_response() -> String {
        serde_json::json!({
            "tasks": [{
                "id": "t1",
                "title": "Implement approval routing",
                "description": "...",
                "user_stories": ["As a manager I approve requests"],
                "technical_notes": [],
                "estimated_effort": "3d",
                "priority": "high",
                "dependencies": [],
                "labels": ["backend"],
                "epic": null
            }],
            "task_breakdown_summary": "1 task",
            "implementation_phases": ["phase 1"],
            "resource_requirements": "1 backend engineer",
            "timeline_estimate": "1 week"
        })
        .to_string()
    }

    #[tokio::test]
    async fn rejects_missing_to_be_document() {
        let provider = StubProvider(sample_response());
        let input = TaskmasterInput {
            request_id: "req-1".into(),
            to_be_document: None,
            implementation_approach: String::new(),
        };
        let result = run(&input, &provider).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn decomposes_to_be_document_into_tasks() {
        let provider = StubProvider(sample_response());
        let input = TaskmasterInput {
            request_id: "req-1".into(),
            to_be_document: Some(sample_to_be()),
            implementation_approach: "Introduce workflow engine".into(),
        };
        let envelope = run(&input, &provider).await.unwrap();
        assert_eq!(envelope.payload.tasks.len(), 1);
        assert!(envelope.confidence > 0.5);
    }
}
