//! Constraint vetoes. Evaluated per candidate in a fixed order with
//! short-circuit on the first failure; filtered candidates are kept for the
//! audit trail with their reason.

use routing_models::{CandidateProfile, ConstraintCheck};

pub const AVAILABILITY: &str = "availability";
pub const CAPACITY: &str = "capacity";

#[derive(Debug)]
pub struct ConstraintOutcome {
    pub passed: Vec<CandidateProfile>,
    pub filtered: Vec<(CandidateProfile, String)>,
    pub checks: Vec<ConstraintCheck>,
}

fn availability_reason(candidate: &CandidateProfile) -> Option<String> {
    if candidate.active {
        None
    } else {
        Some("Human is not active".to_string())
    }
}

fn capacity_reason(candidate: &CandidateProfile, story_points: Option<i32>) -> Option<String> {
    let points = story_points.filter(|p| *p > 0)?;
    let available = candidate.max_story_points - candidate.current_story_points;
    if available < points {
        return Some(format!(
            "Insufficient capacity: {}/{} available, need {}",
            available, candidate.max_story_points, points
        ));
    }
    None
}

/// Apply availability then capacity to every candidate. The per-constraint
/// summary rows cover the whole candidate set so the audit is complete even
/// for candidates a later constraint never saw.
pub fn apply_constraints(
    candidates: Vec<CandidateProfile>,
    story_points: Option<i32>,
) -> ConstraintOutcome {
    let total = candidates.len();
    let mut passed = Vec::new();
    let mut filtered = Vec::new();
    let mut availability_failures = 0usize;
    let mut capacity_failures = 0usize;

    for candidate in candidates {
        if availability_reason(&candidate).is_some() {
            availability_failures += 1;
        }
        if capacity_reason(&candidate, story_points).is_some() {
            capacity_failures += 1;
        }

        if let Some(reason) = availability_reason(&candidate) {
            filtered.push((candidate, reason));
            continue;
        }
        if let Some(reason) = capacity_reason(&candidate, story_points) {
            filtered.push((candidate, reason));
            continue;
        }
        passed.push(candidate);
    }

    let checks = vec![
        ConstraintCheck {
            name: AVAILABILITY.to_string(),
            passed: availability_failures < total || total == 0,
            reason: Some(format!(
                "{} of {} candidates are available",
                total - availability_failures,
                total
            )),
        },
        ConstraintCheck {
            name: CAPACITY.to_string(),
            passed: capacity_failures < total || total == 0,
            reason: Some(format!(
                "{} of {} candidates passed the capacity check",
                total - capacity_failures,
                total
            )),
        },
    ];

    ConstraintOutcome {
        passed,
        filtered,
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, active: bool, max: i32, current: i32) -> CandidateProfile {
        let mut p = CandidateProfile::neutral(id, id);
        p.active = active;
        p.max_story_points = max;
        p.current_story_points = current;
        p
    }

    #[test]
    fn no_story_points_never_triggers_capacity() {
        let outcome = apply_constraints(vec![candidate("h1", true, 21, 21)], None);
        assert_eq!(outcome.passed.len(), 1);
        assert!(outcome.filtered.is_empty());

        let outcome = apply_constraints(vec![candidate("h1", true, 21, 21)], Some(0));
        assert_eq!(outcome.passed.len(), 1);
    }

    #[test]
    fn capacity_vetoes_when_points_exceed_headroom() {
        let outcome =
            apply_constraints(vec![candidate("h1", true, 21, 15)], Some(10));
        assert!(outcome.passed.is_empty());
        let (_, reason) = &outcome.filtered[0];
        assert_eq!(reason, "Insufficient capacity: 6/21 available, need 10");
    }

    #[test]
    fn inactive_humans_are_vetoed_before_capacity() {
        let outcome =
            apply_constraints(vec![candidate("h1", false, 21, 21)], Some(100));
        let (_, reason) = &outcome.filtered[0];
        assert_eq!(reason, "Human is not active");
    }

    #[test]
    fn summary_checks_cover_the_whole_set() {
        let outcome = apply_constraints(
            vec![
                candidate("h1", true, 21, 15),
                candidate("h2", true, 21, 0),
            ],
            Some(10),
        );
        assert_eq!(outcome.passed.len(), 1);
        assert_eq!(outcome.filtered.len(), 1);

        let capacity = outcome
            .checks
            .iter()
            .find(|c| c.name == CAPACITY)
            .unwrap();
        assert!(capacity.passed);
        assert_eq!(
            capacity.reason.as_deref(),
            Some("1 of 2 candidates passed the capacity check")
        );
    }

    #[test]
    fn all_filtered_marks_constraint_failed() {
        let outcome = apply_constraints(
            vec![
                candidate("h1", true, 21, 21),
                candidate("h2", true, 21, 20),
            ],
            Some(100),
        );
        assert!(outcome.passed.is_empty());
        let capacity = outcome
            .checks
            .iter()
            .find(|c| c.name == CAPACITY)
            .unwrap();
        assert!(!capacity.passed);
    }
}
