//! Agents Service handlers (§6 `/api/v1/jobs*`).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::auth_mw::{require_permission, Caller};
use crate::http::error::ApiError;
use crate::http::state::AgentsState;
use crate::workflow::{Priority, WorkflowExecution, WorkflowType};

#[derive(Deserialize)]
pub struct SubmitWorkflowRequest {
    pub request: String,
    pub workflow_type: WorkflowType,
    #[serde(default)]
    pub priority: Priority,
}

pub async fn submit(
    State(state): State<AgentsState>,
    Caller(caller): Caller,
    Json(body): Json<SubmitWorkflowRequest>,
) -> Result<Json<WorkflowExecution>, ApiError> {
    require_permission(&caller, "agents:submit")?;
    if body.request.trim().is_empty() {
        return Err(ApiError::bad_request("request must not be empty"));
    }
    let id = uuid::Uuid::new_v4().to_string();
    let execution = state
        .engine
        .submit(id, body.workflow_type, &caller.id, body.request, body.priority)
        .await?;
    Ok(Json(execution))
}

#[derive(Deserialize)]
pub struct ListWorkflowsQuery {
    pub user_id: Option<String>,
}

pub async fn list(
    State(state): State<AgentsState>,
    Caller(caller): Caller,
    Query(query): Query<ListWorkflowsQuery>,
) -> Result<Json<Vec<WorkflowExecution>>, ApiError> {
    let target_user = if caller.has_permission("users:manage") {
        query.user_id.as_deref().unwrap_or(&caller.id)
    } else {
        &caller.id
    };
    let workflows = state.engine.list_for_user(target_user).await?;
    Ok(Json(workflows))
}

pub async fn status(
    State(state): State<AgentsState>,
    Caller(caller): Caller,
    Path(job_id): Path<String>,
) -> Result<Json<WorkflowExecution>, ApiError> {
    require_permission(&caller, "agents:read")?;
    let execution = state.engine.get_status(&job_id).await?;
    if execution.user_id != caller.id && !caller.has_permission("users:manage") {
        return Err(ApiError::forbidden("workflow belongs to another user"));
    }
    Ok(Json(execution))
}

#[derive(Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
}

#[derive(Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<Answer>,
}

pub async fn submit_answers(
    State(state): State<AgentsState>,
    Caller(caller): Caller,
    Path(job_id): Path<String>,
    Json(body): Json<SubmitAnswersRequest>,
) -> Result<Json<WorkflowExecution>, ApiError> {
    require_permission(&caller, "agents:answer")?;
    let existing = state.engine.get_status(&job_id).await?;
    if existing.user_id != caller.id && !caller.has_permission("users:manage") {
        return Err(ApiError::forbidden("workflow belongs to another user"));
    }
    let answers = body.answers.into_iter().map(|a| (a.question_id, a.answer)).collect();
    let execution = state.engine.resume_with_answers(&job_id, answers).await?;
    Ok(Json(execution))
}

#[derive(Serialize)]
pub struct WorkflowResults {
    pub job_id: String,
    pub status: crate::workflow::WorkflowStatus,
    pub results: std::collections::HashMap<String, agent_stages::prelude::StageOutput>,
    pub error_message: Option<String>,
}

pub async fn results(
    State(state): State<AgentsState>,
    Caller(caller): Caller,
    Path(job_id): Path<String>,
) -> Result<Json<WorkflowResults>, ApiError> {
    require_permission(&caller, "agents:read")?;
    let execution = state.engine.get_status(&job_id).await?;
    if execution.user_id != caller.id && !caller.has_permission("users:manage") {
        return Err(ApiError::forbidden("workflow belongs to another user"));
    }
    Ok(Json(WorkflowResults {
        job_id: execution.id,
        status: execution.status,
        results: execution.results,
        error_message: execution.error_message,
    }))
}
