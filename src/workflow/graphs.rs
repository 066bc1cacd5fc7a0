//! Builds the per-leg [`App`] graphs for the five workflow types (§4.7).
//!
//! Each workflow type is split into a pre-suspend leg (everything up to
//! and including the clarifier, when the workflow has one) and a
//! post-answer leg (synthesizer onward). A workflow with no clarifier
//! stage runs entirely in its pre-suspend leg and never suspends.

use std::sync::Arc;

use ingestion::search::{CallerIdentity, SearchService};
use workflow_engine::app::App;
use workflow_engine::graphs::GraphBuilder;
use workflow_engine::types::NodeKind;

use super::nodes::{ClarifierNode, RetrieveContextNode, SynthesizerNode, TaskmasterNode, VerifierNode};
use super::types::WorkflowType;
use agent_stages::prelude::LlmProvider;

const DEFAULT_SEARCH_K: usize = 8;
const DEFAULT_SEARCH_THRESHOLD: f32 = 0.2;

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

/// Collaborators every graph-building node needs. Built once per workflow
/// submission and shared across both legs.
pub struct NodeDeps {
    pub llm: Arc<dyn LlmProvider>,
    pub search: Arc<SearchService>,
    pub caller: Arc<dyn CallerIdentity + Send + Sync>,
    pub max_clarifier_questions: usize,
}

/// The two legs a workflow type compiles into. `post_answer` is `None`
/// for workflow types that never suspend.
pub struct WorkflowLegs {
    pub pre_suspend: App,
    pub post_answer: Option<App>,
}

fn retrieve_context_node(deps: &NodeDeps) -> RetrieveContextNode {
    RetrieveContextNode {
        search: Arc::clone(&deps.search),
        caller: Arc::clone(&deps.caller),
        k: DEFAULT_SEARCH_K,
        threshold: DEFAULT_SEARCH_THRESHOLD,
    }
}

fn clarifier_node(deps: &NodeDeps) -> ClarifierNode {
    ClarifierNode { llm: Arc::clone(&deps.llm), max_questions: deps.max_clarifier_questions }
}

fn synthesizer_node(deps: &NodeDeps) -> SynthesizerNode {
    SynthesizerNode {
        llm: Arc::clone(&deps.llm),
        search: Arc::clone(&deps.search),
        caller: Arc::clone(&deps.caller),
        k: DEFAULT_SEARCH_K,
        threshold: DEFAULT_SEARCH_THRESHOLD,
    }
}

fn taskmaster_node(deps: &NodeDeps) -> TaskmasterNode {
    TaskmasterNode { llm: Arc::clone(&deps.llm) }
}

fn verifier_node(deps: &NodeDeps) -> VerifierNode {
    VerifierNode { llm: Arc::clone(&deps.llm) }
}

/// `retrieve_context -> clarifier -> End`. Used as the pre-suspend leg of
/// every workflow type that includes a clarifier stage.
fn retrieve_and_clarify_leg(deps: &NodeDeps) -> App {
    GraphBuilder::new()
        .add_node(custom("retrieve_context"), retrieve_context_node(deps))
        .add_node(custom("clarifier"), clarifier_node(deps))
        .add_edge(NodeKind::Start, custom("retrieve_context"))
        .add_edge(custom("retrieve_context"), custom("clarifier"))
        .add_edge(custom("clarifier"), NodeKind::End)
        .compile()
}

/// `synthesizer -> taskmaster -> verifier -> End`, trimmed to the stages
/// the workflow type actually needs (§4.7 per-type stage lists).
fn post_answer_leg(deps: &NodeDeps, workflow_type: WorkflowType) -> App {
    let mut builder = GraphBuilder::new();
    let stages = workflow_type.stages();
    let includes = |name: &str| stages.contains(&name);

    let mut last = NodeKind::Start;
    if includes("synthesizer") {
        builder = builder.add_node(custom("synthesizer"), synthesizer_node(deps));
        builder = builder.add_edge(last, custom("synthesizer"));
        last = custom("synthesizer");
    }
    if includes("taskmaster") {
        builder = builder.add_node(custom("taskmaster"), taskmaster_node(deps));
        builder = builder.add_edge(last, custom("taskmaster"));
        last = custom("taskmaster");
    }
    if includes("verifier") {
        builder = builder.add_node(custom("verifier"), verifier_node(deps));
        builder = builder.add_edge(last, custom("verifier"));
        last = custom("verifier");
    }
    builder.add_edge(last, NodeKind::End).compile()
}

/// `verifier -> End` only, for workflows whose input already carries a
/// to-be document and task list (e.g. `verification_only`).
fn single_stage_leg(deps: &NodeDeps, stage: &str) -> App {
    let node_kind = custom(stage);
    let builder = match stage {
        "synthesizer" => GraphBuilder::new().add_node(node_kind.clone(), synthesizer_node(deps)),
        "verifier" => GraphBuilder::new().add_node(node_kind.clone(), verifier_node(deps)),
        other => unreachable!("single_stage_leg called with unsupported stage {other}"),
    };
    builder.add_edge(NodeKind::Start, node_kind.clone()).add_edge(node_kind, NodeKind::End).compile()
}

/// Compiles the legs for a given workflow type.
#[must_use]
pub fn build_legs(deps: &NodeDeps, workflow_type: WorkflowType) -> WorkflowLegs {
    match workflow_type {
        WorkflowType::Full | WorkflowType::TaskGeneration => WorkflowLegs {
            pre_suspend: retrieve_and_clarify_leg(deps),
            post_answer: Some(post_answer_leg(deps, workflow_type)),
        },
        WorkflowType::ClarificationOnly => {
            WorkflowLegs { pre_suspend: retrieve_and_clarify_leg(deps), post_answer: None }
        }
        WorkflowType::SynthesisOnly => {
            WorkflowLegs { pre_suspend: single_stage_leg(deps, "synthesizer"), post_answer: None }
        }
        WorkflowType::VerificationOnly => {
            WorkflowLegs { pre_suspend: single_stage_leg(deps, "verifier"), post_answer: None }
        }
    }
}
