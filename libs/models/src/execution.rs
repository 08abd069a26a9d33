use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Execution record for a decision. Exactly one of tracker_issue_key and
/// fallback_message is non-null; at most one row exists per decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExecutedAction {
    pub id: String,
    pub decision_id: String,
    pub tracker_issue_key: Option<String>,
    pub tracker_issue_id: Option<String>,
    pub assigned_human_id: String,
    pub backup_human_ids: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub fallback_message: Option<String>,
}
