use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeType {
    Resolved,
    Reassigned,
    Escalated,
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeType::Resolved => "resolved",
            OutcomeType::Reassigned => "reassigned",
            OutcomeType::Escalated => "escalated",
        }
    }
}

impl FromStr for OutcomeType {
    type Err = UnknownOutcomeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resolved" => Ok(OutcomeType::Resolved),
            "reassigned" => Ok(OutcomeType::Reassigned),
            "escalated" => Ok(OutcomeType::Escalated),
            other => Err(UnknownOutcomeType(other.to_string())),
        }
    }
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown outcome type: {0}")]
pub struct UnknownOutcomeType(pub String);

/// Observed downstream event feeding the learning loop. event_id is the
/// global dedupe key; the same event applied twice is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub event_id: String,
    pub work_item_id: String,
    #[serde(default)]
    pub decision_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: OutcomeType,
    pub actor_id: String,
    #[serde(default)]
    pub original_assignee_id: Option<String>,
    #[serde(default)]
    pub new_assignee_id: Option<String>,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}
