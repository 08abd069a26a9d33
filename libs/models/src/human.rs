use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Responder identity. The tracker account id is bijective with the human id
/// when both are set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Human {
    pub id: String,
    pub display_name: String,
    pub tracker_account_id: Option<String>,
    pub active: bool,
    pub coord_x: Option<f64>,
    pub coord_y: Option<f64>,
    pub coord_z: Option<f64>,
}

/// Learned fit per (human, service). fit_score is clamped to [0, 1] on every
/// write; the counters only ever grow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HumanServiceStats {
    pub human_id: String,
    pub service: String,
    pub fit_score: f64,
    pub resolves_count: i32,
    pub transfers_count: i32,
    pub last_resolved_at: Option<DateTime<Utc>>,
}

/// Short-window load signals for one responder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HumanLoad {
    pub human_id: String,
    pub pages_7d: i32,
    pub active_items: i32,
    pub last_updated: DateTime<Utc>,
}
