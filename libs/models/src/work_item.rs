use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Operational urgency tag. sev1 is the highest urgency, sev4 the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Sev1,
    Sev2,
    Sev3,
    Sev4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Sev1 => "sev1",
            Severity::Sev2 => "sev2",
            Severity::Sev3 => "sev3",
            Severity::Sev4 => "sev4",
        }
    }

    /// Tracker priority name for this severity.
    pub fn tracker_priority(&self) -> &'static str {
        match self {
            Severity::Sev1 => "Critical",
            Severity::Sev2 => "High",
            Severity::Sev3 => "Medium",
            Severity::Sev4 => "Low",
        }
    }

    /// Inverse of [`Severity::tracker_priority`], used when syncing closed
    /// issues back from the tracker.
    pub fn from_tracker_priority(priority: &str) -> Severity {
        match priority {
            "Critical" => Severity::Sev1,
            "High" => Severity::Sev2,
            "Medium" => Severity::Sev3,
            _ => Severity::Sev4,
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sev1" => Ok(Severity::Sev1),
            "sev2" => Ok(Severity::Sev2),
            "sev3" => Ok(Severity::Sev3),
            "sev4" => Ok(Severity::Sev4),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkItemType {
    Incident,
    Ticket,
}

impl WorkItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemType::Incident => "incident",
            WorkItemType::Ticket => "ticket",
        }
    }
}

impl FromStr for WorkItemType {
    type Err = UnknownWorkItemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incident" => Ok(WorkItemType::Incident),
            "ticket" => Ok(WorkItemType::Ticket),
            other => Err(UnknownWorkItemType(other.to_string())),
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown work item type: {0}")]
pub struct UnknownWorkItemType(pub String);

/// A routable unit of operational work. Created by Ingest, never deleted.
/// The embedding coordinates are either all set or all null; the tracker
/// issue key is written at most once by Execute.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkItem {
    pub id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub service: String,
    pub severity: String,
    pub description: String,
    pub raw_log: Option<String>,
    pub embedding_x: Option<f64>,
    pub embedding_y: Option<f64>,
    pub embedding_z: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub origin_system: String,
    pub creator_id: Option<String>,
    pub tracker_issue_key: Option<String>,
    pub story_points: Option<i32>,
    pub impact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_round_trips_through_str() {
        for s in ["sev1", "sev2", "sev3", "sev4"] {
            assert_eq!(s.parse::<Severity>().unwrap().as_str(), s);
        }
        assert!("sev5".parse::<Severity>().is_err());
        assert!("SEV1".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_maps_to_tracker_priority() {
        assert_eq!(Severity::Sev1.tracker_priority(), "Critical");
        assert_eq!(Severity::Sev4.tracker_priority(), "Low");
        assert_eq!(Severity::from_tracker_priority("High"), Severity::Sev2);
        assert_eq!(Severity::from_tracker_priority("anything"), Severity::Sev4);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Sev2).unwrap(), "\"sev2\"");
        let parsed: Severity = serde_json::from_str("\"sev3\"").unwrap();
        assert_eq!(parsed, Severity::Sev3);
    }
}
