//! Markdown rendering (§4.10) for Synthesizer documents, Taskmaster task
//! lists, and Verifier reports.

use agent_stages::synthesizer::AnalysisDocument;
use agent_stages::taskmaster::Task;
use agent_stages::verifier::VerifierPayload;

use crate::error::ExportError;

pub fn document_to_markdown(doc: &AnalysisDocument) -> Result<String, ExportError> {
    let mut out = format!("# {}\n\n{}\n\n", doc.title, doc.executive_summary);
    let mut sections = doc.sections.clone();
    sections.sort_by_key(|s| s.order);
    for section in &sections {
        out.push_str(&format!("## {}\n\n{}\n\n", section.title, section.content));
    }
    Ok(out)
}

pub fn tasks_to_markdown(tasks: &[Task]) -> Result<String, ExportError> {
    if tasks.is_empty() {
        return Err(ExportError::Empty);
    }
    let mut out = String::from("# Tasks\n\n");
    for task in tasks {
        out.push_str(&format!("## {} ({})\n\n{}\n\n", task.title, task.priority, task.description));
        if !task.user_stories.is_empty() {
            out.push_str("**User stories:**\n\n");
            for story in &task.user_stories {
                out.push_str(&format!("- {story}\n"));
            }
            out.push('\n');
        }
        if !task.labels.is_empty() {
            out.push_str(&format!("Labels: {}\n\n", task.labels.join(", ")));
        }
    }
    Ok(out)
}

pub fn verification_to_markdown(report: &VerifierPayload) -> Result<String, ExportError> {
    let mut out = format!(
        "# Verification Report\n\n**Approval status:** {:?}\n**Score:** {:.2}\n\n",
        report.approval_status, report.overall_validation.score
    );
    if !report.overall_validation.errors.is_empty() {
        out.push_str("## Errors\n\n");
        for error in &report.overall_validation.errors {
            out.push_str(&format!("- {error}\n"));
        }
        out.push('\n');
    }
    if !report.flagged_issues.is_empty() {
        out.push_str("## Flagged issues\n\n");
        for issue in &report.flagged_issues {
            out.push_str(&format!("- {issue}\n"));
        }
        out.push('\n');
    }
    if !report.recommendations.is_empty() {
        out.push_str("## Recommendations\n\n");
        for rec in &report.recommendations {
            out.push_str(&format!("- {rec}\n"));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_stages::synthesizer::DocumentSection;

    #[test]
    fn renders_sections_in_order() {
        let doc = AnalysisDocument {
            title: "Future State".into(),
            executive_summary: "...".into(),
            sections: vec![
                DocumentSection { id: "b".into(), title: "Second".into(), content: "2".into(), kind: "k".into(), order: 2 },
                DocumentSection { id: "a".into(), title: "First".into(), content: "1".into(), kind: "k".into(), order: 1 },
            ],
        };
        let md = document_to_markdown(&doc).unwrap();
        assert!(md.find("First").unwrap() < md.find("Second").unwrap());
    }
}
