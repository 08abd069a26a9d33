//! Deterministic ticket rendering: assignment block, evidence bullets, and
//! the original description. The same renderer feeds both the tracker
//! payload and the durable fallback text.

use routing_models::{Evidence, ExecuteDecisionRequest};

pub const SUMMARY_MAX_CHARS: usize = 255;

pub fn issue_summary(description: &str) -> String {
    description.chars().take(SUMMARY_MAX_CHARS).collect()
}

fn evidence_line(evidence: &Evidence) -> String {
    let mut line = format!("- {}", evidence.text);
    if !evidence.time_window.is_empty() {
        line.push_str(&format!(" ({})", evidence.time_window));
    }
    if !evidence.source.is_empty() {
        line.push_str(&format!(" [{}]", evidence.source));
    }
    line
}

pub fn issue_description(request: &ExecuteDecisionRequest) -> String {
    let mut parts = vec![
        "Assigned by the incident routing engine".to_string(),
        String::new(),
        format!("*Primary Assignee:* {}", request.primary_human_id),
    ];

    if !request.backup_human_ids.is_empty() {
        parts.push(format!(
            "*Backup Assignees:* {}",
            request.backup_human_ids.join(", ")
        ));
    }

    if !request.evidence.is_empty() {
        parts.push(String::new());
        parts.push("*Evidence:*".to_string());
        for evidence in &request.evidence {
            parts.push(evidence_line(evidence));
        }
    }

    parts.push(String::new());
    parts.push(format!(
        "*Original Description:*\n{}",
        request.work_item.description
    ));

    parts.join("\n")
}

/// Human-readable record persisted when the tracker cannot be reached; the
/// decision must stay actionable from the database alone.
pub fn fallback_message(request: &ExecuteDecisionRequest) -> String {
    let backups = if request.backup_human_ids.is_empty() {
        "None".to_string()
    } else {
        request.backup_human_ids.join(", ")
    };

    let mut message = format!(
        "Tracker issue creation failed\n\n\
         Decision ID: {}\n\
         Work Item ID: {}\n\
         Service: {}\n\
         Severity: {}\n\
         Primary Assignee: {}\n\
         Backup Assignees: {}\n\n\
         Description:\n{}\n",
        request.decision_id,
        request.work_item_id,
        request.work_item.service,
        request.work_item.severity,
        request.primary_human_id,
        backups,
        request.work_item.description,
    );

    if !request.evidence.is_empty() {
        message.push_str("\nEvidence:\n");
        for evidence in &request.evidence {
            message.push_str(&format!("- {}\n", evidence.text));
        }
    }
    message
}
