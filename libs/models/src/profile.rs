use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One Learner profile row: everything Decision needs to filter and score a
/// candidate for a service. Capacity and on-call signals come from the
/// tracker and degrade to defaults when it is unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub human_id: String,
    pub display_name: String,
    pub fit_score: f64,
    pub resolves_count: i32,
    pub transfers_count: i32,
    pub last_resolved_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub on_call: bool,
    pub pages_7d: i32,
    pub active_items: i32,
    pub max_story_points: i32,
    pub current_story_points: i32,
    pub resolved_by_severity: HashMap<String, i64>,
}

impl CandidateProfile {
    /// Neutral profile used when the Learner is unreachable and candidates
    /// are reconstructed from humans who have worked on the service.
    pub fn neutral(human_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            human_id: human_id.into(),
            display_name: display_name.into(),
            fit_score: 0.5,
            resolves_count: 0,
            transfers_count: 0,
            last_resolved_at: None,
            active: true,
            on_call: false,
            pages_7d: 0,
            active_items: 0,
            max_story_points: 21,
            current_story_points: 0,
            resolved_by_severity: HashMap::new(),
        }
    }
}

/// Candidate features as shipped to the Explain service: the profile signals
/// plus what the scoring pass learned about this candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateFeatures {
    pub human_id: String,
    pub display_name: String,
    pub fit_score: f64,
    pub resolves_count: i32,
    pub transfers_count: i32,
    pub last_resolved_at: Option<DateTime<Utc>>,
    pub on_call: bool,
    pub pages_7d: i32,
    pub active_items: i32,
    pub similar_incident_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_profile_is_eligible_and_unloaded() {
        let profile = CandidateProfile::neutral("h1", "Casey");
        assert_eq!(profile.fit_score, 0.5);
        assert_eq!(profile.resolves_count, 0);
        assert_eq!(profile.transfers_count, 0);
        assert!(profile.active);
        assert!(!profile.on_call);
        assert_eq!(profile.max_story_points, 21);
        assert_eq!(profile.current_story_points, 0);
        assert!(profile.resolved_by_severity.is_empty());
    }

    #[test]
    fn profile_round_trips_through_json() {
        let mut profile = CandidateProfile::neutral("h1", "Casey");
        profile.resolved_by_severity.insert("sev2".to_string(), 3);

        let text = serde_json::to_string(&profile).unwrap();
        let parsed: CandidateProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.human_id, "h1");
        assert_eq!(parsed.resolved_by_severity.get("sev2"), Some(&3));
    }
}
