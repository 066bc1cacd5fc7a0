//! Adapts each [`agent_stages`] function into a [`workflow_engine::node::Node`]
//! impl, plus a `retrieve_context` node over the search service. This is
//! the seam the `agent_stages` crate doc comment calls out: the workflow
//! engine knows nothing about clarifiers or to-be documents, only that a
//! node reads and writes a `serde_json::Value` extra map.

use std::sync::Arc;
use std::time::Instant;

use agent_stages::prelude::*;
use async_trait::async_trait;
use ingestion::search::{CallerIdentity, SearchService};
use metrics::histogram;
use rustc_hash::FxHashMap;
use serde_json::Value;
use workflow_engine::node::{Node, NodeContext, NodeError, NodePartial};
use workflow_engine::state::StateSnapshot;

/// Records how long one stage invocation took (§2 "workflow stage
/// durations"), labeled by stage name so `/metrics` breaks down latency
/// per node rather than per leg.
fn record_stage_duration(stage: &'static str, started: Instant) {
    histogram!("acp_workflow_stage_duration_seconds", "stage" => stage).record(started.elapsed().as_secs_f64());
}

fn extra_string(snapshot: &StateSnapshot, key: &'static str) -> Result<String, NodeError> {
    snapshot
        .extra
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(NodeError::MissingInput { what: key })
}

fn extra_strings(snapshot: &StateSnapshot, key: &str) -> Vec<String> {
    snapshot
        .extra
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn provider_error(stage: &'static str, err: StageError) -> NodeError {
    NodeError::Provider { provider: stage, message: err.to_string() }
}

fn single_extra(key: &str, value: Value) -> NodePartial {
    let mut map: FxHashMap<String, Value> = FxHashMap::default();
    map.insert(key.to_string(), value);
    NodePartial::new().with_extra(map)
}

/// Retrieves supporting knowledge for the request before the clarifier
/// runs (§4.7 `retrieve_context`). Search hits are gated by the caller's
/// sensitivity permissions the same way `/search` is (§8 invariant 6).
pub struct RetrieveContextNode {
    pub search: Arc<SearchService>,
    pub caller: Arc<dyn CallerIdentity + Send + Sync>,
    pub k: usize,
    pub threshold: f32,
}

#[async_trait]
impl Node for RetrieveContextNode {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let request = extra_string(&snapshot, "user_request")?;
        ctx.emit("retrieve_context", "searching knowledge base for request context")?;
        let started = Instant::now();
        let hits = self
            .search
            .search(&request, self.k, self.threshold, None, self.caller.as_ref())
            .await
            .map_err(|e| NodeError::Provider { provider: "search", message: e.to_string() })?;
        record_stage_duration("retrieve_context", started);

        let texts: Vec<Value> = hits.iter().map(|h| Value::String(h.text.clone())).collect();
        Ok(single_extra("knowledge_context", Value::Array(texts)))
    }
}

/// Turns the user request into clarifying questions (§4.8 Clarifier).
/// When `clarifier_answers` is already present in `extra` (submitted by
/// the caller after a suspension), this node still re-derives its output
/// deterministically from the same inputs rather than trusting a stale
/// cached value.
pub struct ClarifierNode {
    pub llm: Arc<dyn LlmProvider>,
    pub max_questions: usize,
}

#[async_trait]
impl Node for ClarifierNode {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let request = extra_string(&snapshot, "user_request")?;
        let knowledge_context = extra_strings(&snapshot, "knowledge_context");
        let domain_context = snapshot.extra.get("domain_context").and_then(Value::as_str).map(str::to_string);

        let mut input = ClarifierInput::new("clarifier", request);
        input.knowledge_context = knowledge_context;
        input.domain_context = domain_context;
        input.max_questions = self.max_questions;

        ctx.emit("clarifier", "drafting clarifying questions")?;
        let started = Instant::now();
        let envelope = clarifier::run(&input, self.llm.as_ref()).await.map_err(|e| provider_error("clarifier", e))?;
        record_stage_duration("clarifier", started);
        let value = serde_json::to_value(StageOutput::Clarifier(envelope)).map_err(NodeError::Serde)?;
        Ok(single_extra("clarifier_output", value))
    }
}

/// Produces as-is/to-be documents from the request plus clarifier
/// answers (§4.8 Synthesizer). Pulls supplemental knowledge via search
/// beyond what `retrieve_context` already gathered.
pub struct SynthesizerNode {
    pub llm: Arc<dyn LlmProvider>,
    pub search: Arc<SearchService>,
    pub caller: Arc<dyn CallerIdentity + Send + Sync>,
    pub k: usize,
    pub threshold: f32,
}

#[async_trait]
impl Node for SynthesizerNode {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let request = extra_string(&snapshot, "user_request")?;
        let knowledge_context = extra_strings(&snapshot, "knowledge_context");

        let clarifier_questions: Vec<ClarifierQuestion> = snapshot
            .extra
            .get("clarifier_output")
            .cloned()
            .and_then(|v| serde_json::from_value::<StageOutput>(v).ok())
            .and_then(|output| match output {
                StageOutput::Clarifier(envelope) => Some(envelope.payload.questions),
                _ => None,
            })
            .unwrap_or_default();

        let answers: Vec<(String, String)> = snapshot
            .extra
            .get("clarifier_answers")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|a| {
                        let question_id = a.get("question_id")?.as_str()?.to_string();
                        let answer = a.get("answer")?.as_str()?.to_string();
                        Some((question_id, answer))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut input = SynthesizerInput::new("synthesizer", request);
        input.clarifier_questions = clarifier_questions;
        input.answers = answers;
        input.knowledge_context = knowledge_context;

        let search = Arc::clone(&self.search);
        let caller = Arc::clone(&self.caller);
        let k = self.k;
        let threshold = self.threshold;

        ctx.emit("synthesizer", "synthesizing as-is/to-be documents")?;
        let started = Instant::now();
        let envelope = synthesizer::run(&input, self.llm.as_ref(), move |query| async move {
            let hits = search.search(&query, k, threshold, None, caller.as_ref()).await?;
            Ok(hits.into_iter().map(|h| h.text).collect())
        })
        .await
        .map_err(|e| provider_error("synthesizer", e))?;
        record_stage_duration("synthesizer", started);

        let value = serde_json::to_value(StageOutput::Synthesizer(envelope)).map_err(NodeError::Serde)?;
        Ok(single_extra("synthesizer_output", value))
    }
}

/// Decomposes the synthesizer's `to_be_document` into developer-ready
/// tasks (§4.8 Taskmaster). Fails permanently if that document is
/// missing — the prerequisite check lives in `taskmaster::run` itself.
pub struct TaskmasterNode {
    pub llm: Arc<dyn LlmProvider>,
}

#[async_trait]
impl Node for TaskmasterNode {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let synthesizer_output = snapshot
            .extra
            .get("synthesizer_output")
            .cloned()
            .and_then(|v| serde_json::from_value::<StageOutput>(v).ok());

        let (to_be_document, implementation_approach) = match synthesizer_output {
            Some(StageOutput::Synthesizer(envelope)) => {
                (Some(envelope.payload.to_be_document), envelope.payload.implementation_approach)
            }
            _ => (None, String::new()),
        };

        let input = TaskmasterInput { request_id: "taskmaster".to_string(), to_be_document, implementation_approach };

        ctx.emit("taskmaster", "breaking future-state document into tasks")?;
        let started = Instant::now();
        let envelope = taskmaster::run(&input, self.llm.as_ref()).await.map_err(|e| provider_error("taskmaster", e))?;
        record_stage_duration("taskmaster", started);
        let value = serde_json::to_value(StageOutput::Taskmaster(envelope)).map_err(NodeError::Serde)?;
        Ok(single_extra("taskmaster_output", value))
    }
}

/// Runs verification checks over the to-be document and generated tasks,
/// deriving a deterministic approval status (§4.8 Verifier).
pub struct VerifierNode {
    pub llm: Arc<dyn LlmProvider>,
}

#[async_trait]
impl Node for VerifierNode {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext) -> Result<NodePartial, NodeError> {
        let to_be_document = snapshot
            .extra
            .get("synthesizer_output")
            .cloned()
            .and_then(|v| serde_json::from_value::<StageOutput>(v).ok())
            .and_then(|output| match output {
                StageOutput::Synthesizer(envelope) => Some(envelope.payload.to_be_document),
                _ => None,
            });

        let tasks: Vec<Task> = snapshot
            .extra
            .get("taskmaster_output")
            .cloned()
            .and_then(|v| serde_json::from_value::<StageOutput>(v).ok())
            .and_then(|output| match output {
                StageOutput::Taskmaster(envelope) => Some(envelope.payload.tasks),
                _ => None,
            })
            .unwrap_or_default();

        let input = VerifierInput { request_id: "verifier".to_string(), to_be_document, tasks };

        ctx.emit("verifier", "verifying to-be document and generated tasks")?;
        let started = Instant::now();
        let envelope = verifier::run(&input, self.llm.as_ref()).await.map_err(|e| provider_error("verifier", e))?;
        record_stage_duration("verifier", started);
        let value = serde_json::to_value(StageOutput::Verifier(envelope)).map_err(NodeError::Serde)?;
        Ok(single_extra("verifier_output", value))
    }
}
