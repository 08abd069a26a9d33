//! Candidate scoring: a weighted sum of fit, vector similarity, capacity,
//! and a severity-matched fit component, clamped to [0, 1]. Ties break on
//! resolve history, then transfer history, then id — never on retrieval
//! order.

use routing_common::utils::clamp01;
use routing_models::{CandidateProfile, ScoreBreakdown, Severity};

/// A past work item close to the current one in embedding space.
#[derive(Debug, Clone)]
pub struct SimilarIncident {
    pub work_item_id: String,
    pub resolver_id: Option<String>,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub fit: f64,
    pub similarity: f64,
    pub capacity: f64,
    pub severity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fit: 0.4,
            similarity: 0.3,
            capacity: 0.2,
            severity: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub profile: CandidateProfile,
    pub breakdown: ScoreBreakdown,
    pub rank: i32,
}

/// Severity multiplier. High-severity work leans harder on proven fit: for
/// sev1/sev2 the multiplier scales with the candidate's own fit_score.
pub fn severity_match_score(fit_score: f64, severity: Severity) -> f64 {
    let weight = match severity {
        Severity::Sev1 => 1.2,
        Severity::Sev2 => 1.1,
        Severity::Sev3 => 1.0,
        Severity::Sev4 => 0.9,
    };
    match severity {
        Severity::Sev1 | Severity::Sev2 => 1.0 + (weight - 1.0) * fit_score,
        _ => weight,
    }
}

/// Remaining-capacity score after a hypothetical assignment. A work item
/// with no story points never constrains capacity.
pub fn capacity_score(
    max_story_points: i32,
    current_story_points: i32,
    story_points: Option<i32>,
) -> f64 {
    let Some(points) = story_points.filter(|p| *p > 0) else {
        return 1.0;
    };
    if max_story_points <= 0 {
        return 0.0;
    }

    let available = max_story_points - current_story_points;
    let after_assignment = available - points;
    if after_assignment <= 0 {
        return 0.0;
    }

    let remaining_pct = after_assignment as f64 / max_story_points as f64;
    if remaining_pct >= 0.4 {
        // Lots of headroom reads as underutilization, slight penalty.
        0.9
    } else if remaining_pct >= 0.2 {
        1.0
    } else if remaining_pct >= 0.1 {
        0.8
    } else {
        0.6
    }
}

/// Mean similarity over the neighbors this candidate resolved, boosted for
/// repeat matches. Neutral 0.5 when there is nothing to go on.
pub fn vector_similarity_score(neighbors: &[SimilarIncident], candidate_id: &str) -> f64 {
    if neighbors.is_empty() {
        return 0.5;
    }

    let matched: Vec<&SimilarIncident> = neighbors
        .iter()
        .filter(|n| n.resolver_id.as_deref() == Some(candidate_id))
        .collect();
    if matched.is_empty() {
        return 0.5;
    }

    let mean = matched.iter().map(|n| n.similarity).sum::<f64>() / matched.len() as f64;
    let mut score = mean;
    if matched.len() > 1 {
        let boost = (matched.len() as f64 * 0.05).min(0.2);
        score = (score + boost).min(1.0);
    }
    score.min(1.0)
}

pub fn score_candidate(
    profile: &CandidateProfile,
    severity: Severity,
    story_points: Option<i32>,
    neighbors: &[SimilarIncident],
    weights: ScoringWeights,
) -> ScoreBreakdown {
    let fit = profile.fit_score;
    let severity_match = severity_match_score(fit, severity);
    let capacity = capacity_score(
        profile.max_story_points,
        profile.current_story_points,
        story_points,
    );
    let vector_similarity = vector_similarity_score(neighbors, &profile.human_id);

    let final_score = clamp01(
        fit * weights.fit
            + vector_similarity * weights.similarity
            + capacity * weights.capacity
            + (fit * severity_match) * weights.severity,
    );

    ScoreBreakdown {
        fit_score: fit,
        severity_match,
        capacity,
        vector_similarity,
        final_score,
    }
}

/// Score and rank survivors. Ranks are dense, 1-based, and deterministic.
pub fn rank_candidates(
    candidates: Vec<CandidateProfile>,
    severity: Severity,
    story_points: Option<i32>,
    neighbors: &[SimilarIncident],
    weights: ScoringWeights,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|profile| {
            let breakdown = score_candidate(&profile, severity, story_points, neighbors, weights);
            ScoredCandidate {
                profile,
                breakdown,
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.breakdown
            .final_score
            .partial_cmp(&a.breakdown.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.profile.resolves_count.cmp(&a.profile.resolves_count))
            .then_with(|| a.profile.transfers_count.cmp(&b.profile.transfers_count))
            .then_with(|| a.profile.human_id.cmp(&b.profile.human_id))
    });

    for (i, candidate) in scored.iter_mut().enumerate() {
        candidate.rank = (i + 1) as i32;
    }
    scored
}

/// Decision confidence: the primary's score, boosted by a clear gap to the
/// runner-up, discounted for sparse candidate pools and missing backups.
pub fn confidence(
    primary_score: f64,
    next_best_score: Option<f64>,
    total_candidates: usize,
) -> f64 {
    let mut value = primary_score;

    match next_best_score {
        Some(next) => {
            let gap = primary_score - next;
            value += if gap > 0.2 {
                0.15
            } else if gap > 0.1 {
                0.10
            } else if gap > 0.05 {
                0.05
            } else {
                0.0
            };
        }
        None => value *= 0.9,
    }

    if total_candidates < 3 {
        value *= 0.9;
    }

    clamp01(value)
}
