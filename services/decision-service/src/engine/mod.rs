//! The decision engine: deterministically choose a primary responder and up
//! to two backups for a work item, with a complete audit trail.
//!
//! Infrastructure failures degrade the inputs (neutral similarity, fallback
//! candidates) instead of failing the decision; only a missing work item or
//! an empty candidate set surfaces to the caller.

pub mod candidates;
pub mod constraints;
pub mod scoring;

use crate::db;
use crate::state::AppState;
use chrono::Utc;
use routing_common::adapters::vector_index::SearchFilter;
use routing_common::utils::generate_prefixed_id;
use routing_common::{AppError, Result};
use routing_models::{
    CandidateFeatures, ConstraintCheck, Decision, DecisionCandidate, ExecuteDecisionRequest,
    ExecuteWorkItem, ExplainDecisionRequest, Severity, WorkItem, WorkItemSummary,
};
use scoring::{ScoredCandidate, ScoringWeights, SimilarIncident};
use sqlx::types::Json;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug)]
pub struct DecideOutcome {
    pub decision: Decision,
    pub constraints: Vec<ConstraintCheck>,
    pub replayed: bool,
}

pub async fn decide(state: &AppState, work_item_id: &str) -> Result<DecideOutcome> {
    // Re-entry with the same id is a no-op read.
    if let Some(existing) = db::get_decision_by_work_item(&state.pool, work_item_id).await? {
        info!(%work_item_id, decision_id = %existing.id, "decision already exists, returning existing");
        let constraints = load_checks(state, &existing.id).await?;
        return Ok(DecideOutcome {
            decision: existing,
            constraints,
            replayed: true,
        });
    }

    let work_item = db::get_work_item(&state.pool, work_item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Work item {} not found", work_item_id)))?;

    let severity: Severity = work_item.severity.parse().unwrap_or(Severity::Sev3);

    // Embedding and neighbor lookup both degrade: the similarity component
    // falls back to its neutral value.
    let embedding = embed_description(state, &work_item).await;
    let neighbors = match &embedding {
        Some(vector) => similar_incidents(state, vector, &work_item.service).await,
        None => Vec::new(),
    };

    let all_candidates = candidates::fetch_candidates(state, &work_item.service).await?;
    if all_candidates.is_empty() {
        return Err(AppError::DependencyUnavailable(format!(
            "No candidates found for service {}. The learner may be down or the service has no profiles.",
            work_item.service
        )));
    }
    let total_candidates = all_candidates.len();

    let outcome = constraints::apply_constraints(all_candidates, work_item.story_points);

    if outcome.passed.is_empty() {
        // Audit what was considered, then refuse rather than degrade.
        let decision_id = generate_prefixed_id("dec");
        persist_audit(state, &decision_id, &[], &outcome.filtered, &outcome.checks).await?;
        let reasons = outcome
            .filtered
            .iter()
            .map(|(candidate, reason)| format!("{}: {}", candidate.human_id, reason))
            .collect();
        return Err(AppError::ConstraintExhausted { reasons });
    }

    let ranked = scoring::rank_candidates(
        outcome.passed,
        severity,
        work_item.story_points,
        &neighbors,
        ScoringWeights {
            fit: state.config.weight_fit,
            similarity: state.config.weight_similarity,
            capacity: state.config.weight_capacity,
            severity: state.config.weight_severity,
        },
    );

    let primary = &ranked[0];
    let backups: Vec<&ScoredCandidate> = ranked.iter().skip(1).take(2).collect();
    let confidence = scoring::confidence(
        primary.breakdown.final_score,
        backups.first().map(|b| b.breakdown.final_score),
        total_candidates,
    );

    let decision = Decision {
        id: generate_prefixed_id("dec"),
        work_item_id: work_item_id.to_string(),
        primary_human_id: primary.profile.human_id.clone(),
        backup_human_ids: Json(
            backups
                .iter()
                .map(|b| b.profile.human_id.clone())
                .collect(),
        ),
        confidence,
        created_at: Utc::now(),
    };

    let mut tx = state.pool.begin().await?;
    if !db::insert_decision(&mut tx, &decision).await? {
        // A concurrent decide won the unique key; recover into a read.
        tx.rollback().await?;
        let existing = db::get_decision_by_work_item(&state.pool, work_item_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("decision conflict without an existing row".to_string())
            })?;
        let constraints = load_checks(state, &existing.id).await?;
        return Ok(DecideOutcome {
            decision: existing,
            constraints,
            replayed: true,
        });
    }
    for scored in &ranked {
        db::insert_candidate(
            &mut tx,
            &DecisionCandidate {
                decision_id: decision.id.clone(),
                human_id: scored.profile.human_id.clone(),
                score: scored.breakdown.final_score,
                rank: scored.rank,
                filtered: false,
                filter_reason: None,
                score_breakdown: Some(Json(scored.breakdown.clone())),
            },
        )
        .await?;
    }
    for (offset, (candidate, reason)) in outcome.filtered.iter().enumerate() {
        db::insert_candidate(
            &mut tx,
            &DecisionCandidate {
                decision_id: decision.id.clone(),
                human_id: candidate.human_id.clone(),
                score: 0.0,
                rank: (ranked.len() + offset + 1) as i32,
                filtered: true,
                filter_reason: Some(reason.clone()),
                score_breakdown: None,
            },
        )
        .await?;
    }
    for check in &outcome.checks {
        db::insert_constraint_result(&mut tx, &decision.id, check).await?;
    }
    tx.commit().await?;

    info!(
        %work_item_id,
        decision_id = %decision.id,
        primary = %decision.primary_human_id,
        confidence,
        "decision persisted"
    );

    // Mirror the work item into the index for future similarity lookups.
    if let Some(vector) = &embedding {
        let mut properties = HashMap::new();
        properties.insert("service".to_string(), work_item.service.clone());
        properties.insert("severity".to_string(), work_item.severity.clone());
        properties.insert("description".to_string(), work_item.description.clone());
        if let Err(err) = state
            .vector_index
            .upsert(work_item_id, vector, properties)
            .await
        {
            warn!(%work_item_id, "vector index upsert failed: {}", err);
        }
    }

    if state.config.orchestrate {
        fan_out(state, &work_item, &decision, &ranked, &outcome.checks).await;
    }

    Ok(DecideOutcome {
        decision,
        constraints: outcome.checks,
        replayed: false,
    })
}

async fn embed_description(state: &AppState, work_item: &WorkItem) -> Option<Vec<f64>> {
    if work_item.description.trim().is_empty() {
        warn!(work_item_id = %work_item.id, "no description, skipping embedding");
        return None;
    }
    match state.language_model.embed(&work_item.description).await {
        Ok(vector) => Some(vector),
        Err(err) => {
            warn!(
                work_item_id = %work_item.id,
                "embedding failed ({}), continuing without vector similarity",
                err
            );
            None
        }
    }
}

async fn similar_incidents(
    state: &AppState,
    embedding: &[f64],
    service: &str,
) -> Vec<SimilarIncident> {
    match state
        .vector_index
        .search(
            embedding,
            Some(SearchFilter::service(service)),
            state.config.neighbor_limit,
        )
        .await
    {
        Ok(neighbors) => {
            info!(count = neighbors.len(), %service, "similar incidents found");
            neighbors
                .into_iter()
                .map(|n| SimilarIncident {
                    resolver_id: n.property("resolver_id").map(|s| s.to_string()),
                    similarity: n.similarity,
                    work_item_id: n.id,
                })
                .collect()
        }
        Err(err) => {
            warn!("similarity search failed ({}), continuing without neighbors", err);
            Vec::new()
        }
    }
}

/// Audit rows for a decision that never produced a selection (all
/// candidates vetoed). Ranks follow the filtered ordering.
async fn persist_audit(
    state: &AppState,
    decision_id: &str,
    survivors: &[ScoredCandidate],
    filtered: &[(routing_models::CandidateProfile, String)],
    checks: &[ConstraintCheck],
) -> Result<()> {
    let mut tx = state.pool.begin().await?;
    for (offset, (candidate, reason)) in filtered.iter().enumerate() {
        db::insert_candidate(
            &mut tx,
            &DecisionCandidate {
                decision_id: decision_id.to_string(),
                human_id: candidate.human_id.clone(),
                score: 0.0,
                rank: (survivors.len() + offset + 1) as i32,
                filtered: true,
                filter_reason: Some(reason.clone()),
                score_breakdown: None,
            },
        )
        .await?;
    }
    for check in checks {
        db::insert_constraint_result(&mut tx, decision_id, check).await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn load_checks(state: &AppState, decision_id: &str) -> Result<Vec<ConstraintCheck>> {
    let results = db::get_constraint_results(&state.pool, decision_id).await?;
    Ok(results
        .into_iter()
        .map(|r| ConstraintCheck {
            name: r.constraint_name,
            passed: r.passed,
            reason: r.reason,
        })
        .collect())
}

fn features(scored: &ScoredCandidate) -> CandidateFeatures {
    CandidateFeatures {
        human_id: scored.profile.human_id.clone(),
        display_name: scored.profile.display_name.clone(),
        fit_score: scored.profile.fit_score,
        resolves_count: scored.profile.resolves_count,
        transfers_count: scored.profile.transfers_count,
        last_resolved_at: scored.profile.last_resolved_at,
        on_call: scored.profile.on_call,
        pages_7d: scored.profile.pages_7d,
        active_items: scored.profile.active_items,
        similar_incident_score: Some(scored.breakdown.vector_similarity),
    }
}

/// Explain then Execute, both best-effort. Evidence degrades to empty when
/// Explain fails; nothing here ever rolls back the committed decision.
async fn fan_out(
    state: &AppState,
    work_item: &WorkItem,
    decision: &Decision,
    ranked: &[ScoredCandidate],
    checks: &[ConstraintCheck],
) {
    let backups: Vec<&ScoredCandidate> = ranked.iter().skip(1).take(2).collect();

    let explain_request = ExplainDecisionRequest {
        decision_id: decision.id.clone(),
        work_item: WorkItemSummary {
            id: work_item.id.clone(),
            service: work_item.service.clone(),
            severity: work_item.severity.clone(),
            description: work_item.description.clone(),
            kind: work_item.kind.clone(),
        },
        primary_human_id: decision.primary_human_id.clone(),
        primary_features: features(&ranked[0]),
        backup_human_ids: decision.backup_human_ids.0.clone(),
        backup_features: backups.iter().map(|b| features(b)).collect(),
        constraints_checked: checks.to_vec(),
    };

    let evidence = match state.explain.explain(&explain_request).await {
        Ok(response) => {
            info!(
                decision_id = %decision.id,
                bullets = response.evidence.len(),
                "explain returned evidence"
            );
            response.evidence
        }
        Err(err) => {
            warn!(decision_id = %decision.id, "explain failed ({}), continuing without evidence", err);
            Vec::new()
        }
    };

    let execute_request = ExecuteDecisionRequest {
        decision_id: decision.id.clone(),
        work_item_id: work_item.id.clone(),
        primary_human_id: decision.primary_human_id.clone(),
        backup_human_ids: decision.backup_human_ids.0.clone(),
        evidence,
        work_item: ExecuteWorkItem {
            service: work_item.service.clone(),
            severity: work_item.severity.clone(),
            description: work_item.description.clone(),
            story_points: work_item.story_points,
        },
    };

    match state.execute.execute(&execute_request).await {
        Ok(response) => match response.tracker_issue_key {
            Some(key) => info!(decision_id = %decision.id, issue_key = %key, "tracker issue created"),
            None => warn!(decision_id = %decision.id, "execution used the durable fallback"),
        },
        Err(err) => {
            warn!(decision_id = %decision.id, "execute failed ({}), decision stands unexecuted", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routing_models::CandidateProfile;

    fn candidate(
        id: &str,
        fit: f64,
        resolves: i32,
        transfers: i32,
        current_points: i32,
    ) -> CandidateProfile {
        let mut p = CandidateProfile::neutral(id, id.to_uppercase());
        p.fit_score = fit;
        p.resolves_count = resolves;
        p.transfers_count = transfers;
        p.max_story_points = 21;
        p.current_story_points = current_points;
        p
    }

    fn select(
        candidates: Vec<CandidateProfile>,
        severity: Severity,
        story_points: Option<i32>,
    ) -> (constraints::ConstraintOutcome, Vec<ScoredCandidate>, f64) {
        let total = candidates.len();
        let outcome = constraints::apply_constraints(candidates, story_points);
        let ranked = scoring::rank_candidates(
            outcome.passed.clone(),
            severity,
            story_points,
            &[],
            scoring::ScoringWeights::default(),
        );
        let confidence = scoring::confidence(
            ranked[0].breakdown.final_score,
            ranked.get(1).map(|c| c.breakdown.final_score),
            total,
        );
        (outcome, ranked, confidence)
    }

    #[test]
    fn straight_path_picks_the_stronger_fit() {
        let (outcome, ranked, confidence) = select(
            vec![
                candidate("h1", 0.85, 12, 1, 13),
                candidate("h2", 0.75, 8, 0, 9),
            ],
            Severity::Sev2,
            None,
        );

        assert!(outcome.filtered.is_empty());
        assert_eq!(ranked[0].profile.human_id, "h1");
        assert_eq!(ranked[1].profile.human_id, "h2");

        // h1: 0.85·0.4 + 0.5·0.3 + 1.0·0.2 + 0.85·1.085·0.1, gap bonus 0.05,
        // two-candidate pool discount 0.9.
        assert!((ranked[0].breakdown.final_score - 0.782225).abs() < 1e-6);
        assert!((confidence - 0.7490025).abs() < 1e-6);
    }

    #[test]
    fn capacity_veto_reroutes_to_the_backup() {
        let (straight_outcome, _, straight_confidence) = select(
            vec![
                candidate("h1", 0.85, 12, 1, 13),
                candidate("h2", 0.75, 8, 0, 9),
            ],
            Severity::Sev2,
            None,
        );
        assert!(straight_outcome.filtered.is_empty());

        let (outcome, ranked, confidence) = select(
            vec![
                candidate("h1", 0.85, 12, 1, 15),
                candidate("h2", 0.75, 8, 0, 9),
            ],
            Severity::Sev2,
            Some(10),
        );

        assert_eq!(outcome.filtered.len(), 1);
        let (filtered, reason) = &outcome.filtered[0];
        assert_eq!(filtered.human_id, "h1");
        assert!(reason.contains("Insufficient capacity"));

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].profile.human_id, "h2");
        assert!(confidence < straight_confidence);
    }

    #[test]
    fn exhausted_constraints_leave_no_selection() {
        let candidates = vec![
            candidate("h1", 0.85, 12, 1, 21),
            candidate("h2", 0.75, 8, 0, 20),
        ];
        let outcome = constraints::apply_constraints(candidates, Some(100));

        assert!(outcome.passed.is_empty());
        assert_eq!(outcome.filtered.len(), 2);
        assert!(outcome
            .filtered
            .iter()
            .all(|(_, reason)| reason.contains("Insufficient capacity")));
        let capacity_check = outcome
            .checks
            .iter()
            .find(|c| c.name == constraints::CAPACITY)
            .unwrap();
        assert!(!capacity_check.passed);
    }

    #[test]
    fn audit_ranks_stay_dense_across_survivors_and_filtered() {
        let (outcome, ranked, _) = select(
            vec![
                candidate("h1", 0.85, 12, 1, 15),
                candidate("h2", 0.75, 8, 0, 9),
                candidate("h3", 0.65, 2, 0, 20),
            ],
            Severity::Sev3,
            Some(10),
        );

        // Survivors take ranks 1..n, filtered candidates continue from there
        // in filtered order, exactly as the audit rows are written.
        let survivor_ranks: Vec<i32> = ranked.iter().map(|c| c.rank).collect();
        assert_eq!(survivor_ranks, vec![1]);
        let filtered_ranks: Vec<i32> = (0..outcome.filtered.len())
            .map(|offset| (ranked.len() + offset + 1) as i32)
            .collect();
        assert_eq!(filtered_ranks, vec![2, 3]);
    }
}
