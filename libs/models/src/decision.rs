use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Selection record: one per work item, immutable after first write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Decision {
    pub id: String,
    pub work_item_id: String,
    pub primary_human_id: String,
    pub backup_human_ids: Json<Vec<String>>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Named score components for one scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub fit_score: f64,
    pub severity_match: f64,
    pub capacity: f64,
    pub vector_similarity: f64,
    pub final_score: f64,
}

/// Audit row for every human considered during a decision. Filtered
/// candidates carry a reason and score 0; survivors carry the breakdown.
/// Ranks are dense and 1-based across the whole considered set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DecisionCandidate {
    pub decision_id: String,
    pub human_id: String,
    pub score: f64,
    pub rank: i32,
    pub filtered: bool,
    pub filter_reason: Option<String>,
    pub score_breakdown: Option<Json<ScoreBreakdown>>,
}

/// Audit row per constraint evaluated for a decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConstraintResult {
    pub decision_id: String,
    pub constraint_name: String,
    pub passed: bool,
    pub reason: Option<String>,
}

/// Constraint shape used on the wire, without the owning decision id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub name: String,
    pub passed: bool,
    pub reason: Option<String>,
}
