use serde::{Deserialize, Serialize};

/// Category tag for an evidence bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    RecentResolution,
    OnCall,
    LowLoad,
    SimilarIncident,
    FitScore,
    General,
}

/// A grounded, time-bounded, sourced claim justifying a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceKind,
    pub text: String,
    pub time_window: String,
    pub source: String,
}

impl Evidence {
    pub fn new(
        kind: EvidenceKind,
        text: impl Into<String>,
        time_window: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            time_window: time_window.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EvidenceKind::SimilarIncident).unwrap();
        assert_eq!(json, "\"similar_incident\"");
        let parsed: EvidenceKind = serde_json::from_str("\"recent_resolution\"").unwrap();
        assert_eq!(parsed, EvidenceKind::RecentResolution);
    }
}
