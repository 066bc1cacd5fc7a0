//! Orchestration service that drives the per-leg graphs built in
//! [`super::graphs`] (§4.7, §5).
//!
//! Submitting a workflow runs its pre-suspend leg to completion. If the
//! workflow type has a clarifier stage, that leg ends with the workflow
//! parked in `WaitingForInput`; [`WorkflowEngine::resume_with_answers`]
//! then runs the post-answer leg against a fresh session seeded with the
//! accumulated `shared_data`.

use std::sync::Arc;
use std::time::Duration;

use agent_stages::prelude::StageOutput;
use audit_chain::prelude::{AuditChain, NewAuditEntry, Severity};
use chrono::Utc;
use ingestion::backoff::{retry_with_backoff, RetryPolicy};
use serde_json::Value;
use tokio::sync::Semaphore;
use workflow_engine::runtimes::{AppRunner, CheckpointerType, RunnerError, StepOptions, StepResult};
use workflow_engine::state::VersionedState;

use super::error::WorkflowError;
use super::graphs::{build_legs, NodeDeps};
use super::store::WorkflowStore;
use super::types::{StepStatus, WorkflowContext, WorkflowExecution, WorkflowStatus, WorkflowType};

fn runner_is_transient(err: &RunnerError) -> bool {
    err.to_string().contains("transient")
}

/// Tunable limits the engine enforces while running legs (§4.7, §5).
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub per_stage_timeout: Duration,
    pub workflow_timeout: Duration,
    pub concurrency_cap: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            per_stage_timeout: Duration::from_secs(300),
            workflow_timeout: Duration::from_secs(1800),
            concurrency_cap: 10,
        }
    }
}

pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    audit: Arc<dyn AuditChain>,
    deps: Arc<NodeDeps>,
    limits: EngineLimits,
    semaphore: Arc<Semaphore>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        audit: Arc<dyn AuditChain>,
        deps: Arc<NodeDeps>,
        limits: EngineLimits,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(limits.concurrency_cap));
        Self { store, audit, deps, limits, semaphore }
    }

    /// Starts a new workflow execution and runs its pre-suspend leg.
    pub async fn submit(
        &self,
        id: impl Into<String>,
        workflow_type: WorkflowType,
        user_id: impl Into<String>,
        request: impl Into<String>,
        priority: super::types::Priority,
    ) -> Result<WorkflowExecution, WorkflowError> {
        let _permit = self.semaphore.try_acquire().map_err(|_| WorkflowError::ConcurrencyCapReached)?;

        let id = id.into();
        let user_id = user_id.into();
        let request = request.into();
        let mut execution = WorkflowExecution::new(id.clone(), workflow_type, user_id.clone(), request.clone(), priority);
        execution.status = WorkflowStatus::Running;
        execution.started_at = Some(Utc::now());
        execution.context.set("user_request", Value::String(request));

        self.audit
            .append(
                NewAuditEntry::new("workflow.submitted", Severity::Low)
                    .with_user(user_id)
                    .with_resource("workflow", &id)
                    .with_details(serde_json::json!({"workflow_type": workflow_type})),
            )
            .await
            .map_err(|e| WorkflowError::Runner(e.to_string()))?;

        self.run_pre_suspend_leg(&mut execution).await?;
        self.store.put(execution.clone()).await.map_err(|e| WorkflowError::Runner(e.to_string()))?;
        Ok(execution)
    }

    /// Submits answers to a workflow parked in `WaitingForInput` and runs
    /// its post-answer leg to completion.
    pub async fn resume_with_answers(
        &self,
        id: &str,
        answers: Vec<(String, String)>,
    ) -> Result<WorkflowExecution, WorkflowError> {
        let _permit = self.semaphore.try_acquire().map_err(|_| WorkflowError::ConcurrencyCapReached)?;

        let mut execution = self.store.get(id).await.map_err(|e| WorkflowError::Runner(e.to_string()))?;
        if execution.status != WorkflowStatus::WaitingForInput {
            return Err(WorkflowError::NotWaitingForInput(id.to_string(), execution.status));
        }

        let answers_json: Vec<Value> = answers
            .into_iter()
            .map(|(question_id, answer)| serde_json::json!({"question_id": question_id, "answer": answer}))
            .collect();
        execution.context.set("clarifier_answers", Value::Array(answers_json));
        execution.status = WorkflowStatus::Running;

        self.run_post_answer_leg(&mut execution).await?;
        self.store.put(execution.clone()).await.map_err(|e| WorkflowError::Runner(e.to_string()))?;
        Ok(execution)
    }

    pub async fn get_status(&self, id: &str) -> Result<WorkflowExecution, WorkflowError> {
        self.store.get(id).await.map_err(|_| WorkflowError::NotFound(id.to_string()))
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkflowExecution>, WorkflowError> {
        self.store.list_for_user(user_id).await.map_err(|e| WorkflowError::Runner(e.to_string()))
    }

    async fn run_pre_suspend_leg(&self, execution: &mut WorkflowExecution) -> Result<(), WorkflowError> {
        let legs = build_legs(&self.deps, execution.workflow_type);
        let initial_state = seed_state(&execution.context);
        let session_id = format!("{}-pre", execution.id);

        let final_state = tokio::time::timeout(
            self.limits.workflow_timeout,
            self.run_leg_with_retry(legs.pre_suspend, session_id, initial_state),
        )
        .await
        .map_err(|_| WorkflowError::WorkflowTimeout)??;

        absorb_extra_into_context(&final_state, &mut execution.context);
        mark_steps_completed(execution, &["retrieve_context", "clarifier", "synthesizer", "taskmaster", "verifier"]);

        if legs.post_answer.is_some() && execution.workflow_type.has_clarifier() {
            execution.status = WorkflowStatus::WaitingForInput;
        } else {
            finalize(execution);
        }
        Ok(())
    }

    async fn run_post_answer_leg(&self, execution: &mut WorkflowExecution) -> Result<(), WorkflowError> {
        let legs = build_legs(&self.deps, execution.workflow_type);
        let post_answer = legs.post_answer.ok_or_else(|| {
            WorkflowError::Runner(format!("workflow type {:?} has no post-answer leg", execution.workflow_type))
        })?;
        let initial_state = seed_state(&execution.context);
        let session_id = format!("{}-post", execution.id);

        let final_state = tokio::time::timeout(
            self.limits.workflow_timeout,
            self.run_leg_with_retry(post_answer, session_id, initial_state),
        )
        .await
        .map_err(|_| WorkflowError::WorkflowTimeout)??;

        absorb_extra_into_context(&final_state, &mut execution.context);
        finalize(execution);
        Ok(())
    }

    async fn run_leg_with_retry(
        &self,
        app: workflow_engine::app::App,
        session_id: String,
        initial_state: VersionedState,
    ) -> Result<VersionedState, WorkflowError> {
        let stage_timeout = self.limits.per_stage_timeout;
        retry_with_backoff(RetryPolicy::default(), runner_is_transient, move || {
            let app = app.clone();
            let session_id = session_id.clone();
            let initial_state = initial_state.clone();
            async move { run_leg_once(app, session_id, initial_state, stage_timeout).await }
        })
        .await
    }
}

async fn run_leg_once(
    app: workflow_engine::app::App,
    session_id: String,
    initial_state: VersionedState,
    stage_timeout: Duration,
) -> Result<VersionedState, WorkflowError> {
    let mut runner = AppRunner::new(app, CheckpointerType::InMemory).await;
    runner
        .create_session(session_id.clone(), initial_state)
        .await
        .map_err(|e| WorkflowError::Runner(e.to_string()))?;

    loop {
        let done = {
            let session = runner
                .get_session(&session_id)
                .ok_or_else(|| WorkflowError::Runner(format!("session {session_id} vanished mid-run")))?;
            session.frontier.is_empty()
                || session.frontier.iter().all(|n| *n == workflow_engine::types::NodeKind::End)
        };
        if done {
            break;
        }

        let step_result = tokio::time::timeout(stage_timeout, runner.run_step(&session_id, StepOptions::default()))
            .await
            .map_err(|_| WorkflowError::StageTimeout { stage: session_id.clone() })?
            .map_err(|e| WorkflowError::Runner(e.to_string()))?;

        match step_result {
            StepResult::Completed(report) => {
                if report.completed {
                    break;
                }
            }
            StepResult::Paused(_) => {
                return Err(WorkflowError::Runner("leg paused unexpectedly".to_string()));
            }
        }
    }

    let session = runner
        .get_session(&session_id)
        .ok_or_else(|| WorkflowError::Runner(format!("session {session_id} vanished after run")))?;
    Ok(session.state.clone())
}

fn seed_state(context: &WorkflowContext) -> VersionedState {
    let mut builder = VersionedState::builder();
    for (key, value) in &context.shared_data {
        builder = builder.with_extra(key, value.clone());
    }
    builder.build()
}

fn absorb_extra_into_context(state: &VersionedState, context: &mut WorkflowContext) {
    for (key, value) in state.extra.snapshot().iter() {
        context.shared_data.insert(key.clone(), value.clone());
    }
}

fn mark_steps_completed(execution: &mut WorkflowExecution, stage_names: &[&str]) {
    for step in &mut execution.steps {
        if stage_names.contains(&step.stage.as_str()) {
            let output_key = format!("{}_output", step.stage);
            if let Some(value) = execution.context.get(&output_key) {
                if let Ok(output) = serde_json::from_value::<StageOutput>(value.clone()) {
                    execution.results.insert(step.stage.clone(), output);
                    step.status = StepStatus::Completed;
                    step.completed_at = Some(Utc::now());
                }
            } else if step.stage == "retrieve_context" && execution.context.get("knowledge_context").is_some() {
                step.status = StepStatus::Completed;
                step.completed_at = Some(Utc::now());
            }
        }
    }
}

fn finalize(execution: &mut WorkflowExecution) {
    execution.status = WorkflowStatus::Completed;
    execution.completed_at = Some(Utc::now());
}
