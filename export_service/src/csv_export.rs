//! CSV rendering (§4.10). Tasks use a fixed Jira-shaped column mapping;
//! search results use a flat column set.

use agent_stages::taskmaster::Task;
use ingestion::search::SearchResult;
use serde::Serialize;

use crate::error::ExportError;

/// Fixed column mapping for task export (§4.10: "Issue Type, Summary,
/// Description, Priority, Labels, Components, Assignee, Reporter, Project
/// Key"). `Task` carries no components/assignee/reporter fields upstream
/// (§4.8 doesn't model them); those columns are emitted empty rather than
/// omitted, so the header stays stable across exports.
#[derive(Serialize)]
struct TaskRow {
    #[serde(rename = "Issue Type")]
    issue_type: String,
    #[serde(rename = "Summary")]
    summary: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "Labels")]
    labels: String,
    #[serde(rename = "Components")]
    components: String,
    #[serde(rename = "Assignee")]
    assignee: String,
    #[serde(rename = "Reporter")]
    reporter: String,
    #[serde(rename = "Project Key")]
    project_key: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            issue_type: "Task".to_string(),
            summary: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.clone(),
            labels: task.labels.join(";"),
            components: String::new(),
            assignee: String::new(),
            reporter: String::new(),
            project_key: task.epic.clone().unwrap_or_default(),
        }
    }
}

pub fn tasks_to_csv(tasks: &[Task]) -> Result<String, ExportError> {
    if tasks.is_empty() {
        return Err(ExportError::Empty);
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    for task in tasks {
        writer.serialize(TaskRow::from(task))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Serialize)]
struct SearchResultRow {
    chunk_id: String,
    rank: usize,
    similarity: f32,
    text: String,
}

pub fn search_results_to_csv(results: &[SearchResult]) -> Result<String, ExportError> {
    if results.is_empty() {
        return Err(ExportError::Empty);
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(SearchResultRow {
            chunk_id: result.chunk_id.clone(),
            rank: result.rank,
            similarity: result.similarity,
            text: result.text.clone(),
        })?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: "t1".into(),
            title: "Implement login".into(),
            description: "Add OAuth login flow".into(),
            user_stories: vec![],
            technical_notes: vec![],
            estimated_effort: "2d".into(),
            priority: "high".into(),
            dependencies: vec![],
            labels: vec!["backend".into(), "auth".into()],
            epic: Some("AUTH".into()),
        }
    }

    #[test]
    fn task_csv_has_fixed_header() {
        let csv = tasks_to_csv(&[sample_task()]).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "Issue Type,Summary,Description,Priority,Labels,Components,Assignee,Reporter,Project Key"
        );
    }

    #[test]
    fn empty_tasks_error() {
        assert!(matches!(tasks_to_csv(&[]), Err(ExportError::Empty)));
    }
}
