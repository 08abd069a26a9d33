//! Cross-service request/response shapes for the decision fan-out path.

use crate::{CandidateFeatures, ConstraintCheck, Evidence};
use serde::{Deserialize, Serialize};

/// Work item fields the explanation layer grounds its claims in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemSummary {
    pub id: String,
    pub service: String,
    pub severity: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainDecisionRequest {
    pub decision_id: String,
    pub work_item: WorkItemSummary,
    pub primary_human_id: String,
    pub primary_features: CandidateFeatures,
    #[serde(default)]
    pub backup_human_ids: Vec<String>,
    #[serde(default)]
    pub backup_features: Vec<CandidateFeatures>,
    #[serde(default)]
    pub constraints_checked: Vec<ConstraintCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainDecisionResponse {
    pub decision_id: String,
    pub evidence: Vec<Evidence>,
    pub constraints: Vec<ConstraintCheck>,
    pub why_not_next_best: String,
}

/// Work item fields the tracker ticket needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteWorkItem {
    pub service: String,
    pub severity: String,
    pub description: String,
    #[serde(default)]
    pub story_points: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteDecisionRequest {
    pub decision_id: String,
    pub work_item_id: String,
    pub primary_human_id: String,
    #[serde(default)]
    pub backup_human_ids: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    pub work_item: ExecuteWorkItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteDecisionResponse {
    pub executed_action_id: String,
    pub tracker_issue_key: Option<String>,
    pub tracker_issue_id: Option<String>,
    pub assigned_human_id: String,
    pub created_at: String,
    pub message: String,
    pub fallback_used: bool,
}
