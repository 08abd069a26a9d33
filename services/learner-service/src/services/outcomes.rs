//! Outcome application: the learning loop.
//!
//! One transaction per event. The dedupe check runs inside the same
//! transaction that applies the updates, so a partial failure rolls
//! everything back and a retry can safely re-apply. The unique key on
//! outcomes_dedupe.event_id is the at-most-once guarantee under concurrency.

use crate::db;
use crate::state::AppState;
use routing_common::{AppError, Result};
use routing_models::{Outcome, OutcomeType};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct StatUpdate {
    pub human_id: String,
    pub service: String,
    pub fit_score: f64,
    pub change: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OutcomeReport {
    pub processed: bool,
    pub event_id: String,
    pub updates: Vec<StatUpdate>,
    pub message: String,
}

pub async fn process_outcome(state: &AppState, outcome: Outcome) -> Result<OutcomeReport> {
    if outcome.event_id.trim().is_empty() {
        return Err(AppError::InvalidInput("event_id is required".to_string()));
    }
    if outcome.service.trim().is_empty() {
        return Err(AppError::InvalidInput("service is required".to_string()));
    }

    // Resolve the original assignee for transfers before opening the
    // transaction; the Decision lookup is a network call.
    let original_assignee = match outcome.kind {
        OutcomeType::Reassigned => resolve_original_assignee(state, &outcome).await,
        _ => None,
    };

    let mut tx = state.pool.begin().await?;

    if db::is_event_processed(&mut tx, &outcome.event_id).await? {
        info!(event_id = %outcome.event_id, "outcome already processed, skipping");
        return Ok(OutcomeReport {
            processed: false,
            event_id: outcome.event_id,
            updates: Vec::new(),
            message: "Outcome already processed".to_string(),
        });
    }

    let mut updates = Vec::new();
    match outcome.kind {
        OutcomeType::Resolved => {
            apply_resolved(state, &mut tx, &outcome, &mut updates).await?;
        }
        OutcomeType::Reassigned => {
            let new_assignee = outcome
                .new_assignee_id
                .clone()
                .unwrap_or_else(|| outcome.actor_id.clone());
            apply_reassigned(
                state,
                &mut tx,
                &outcome,
                original_assignee.as_deref(),
                &new_assignee,
                &mut updates,
            )
            .await?;
        }
        OutcomeType::Escalated => {
            // Responsibility growth without transfer: the actor is both ends.
            let actor = outcome.actor_id.clone();
            apply_reassigned(
                state,
                &mut tx,
                &outcome,
                Some(actor.as_str()),
                &actor,
                &mut updates,
            )
            .await?;
        }
    }

    db::mark_event_processed(&mut tx, &outcome.event_id, chrono::Utc::now()).await?;

    match tx.commit().await {
        Ok(()) => {}
        Err(err) if AppError::is_unique_violation(&err) => {
            // A concurrent delivery of the same event won the race.
            return Ok(OutcomeReport {
                processed: false,
                event_id: outcome.event_id,
                updates: Vec::new(),
                message: "Outcome already processed".to_string(),
            });
        }
        Err(err) => return Err(err.into()),
    }

    if outcome.kind == OutcomeType::Resolved {
        let state = state.clone();
        let human_id = outcome.actor_id.clone();
        let service = outcome.service.clone();
        tokio::spawn(async move {
            crate::services::embedding::refresh_capability_embedding(state, human_id, service)
                .await;
        });
    }

    info!(
        event_id = %outcome.event_id,
        kind = %outcome.kind,
        updates = updates.len(),
        "processed outcome"
    );

    Ok(OutcomeReport {
        processed: true,
        event_id: outcome.event_id,
        updates,
        message: "Stats updated successfully".to_string(),
    })
}

async fn apply_resolved(
    state: &AppState,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    outcome: &Outcome,
    updates: &mut Vec<StatUpdate>,
) -> Result<()> {
    let actor = &outcome.actor_id;
    db::ensure_human_tx(tx, actor).await?;
    db::apply_resolution(
        tx,
        actor,
        &outcome.service,
        state.config.resolve_fit_boost,
        outcome.timestamp,
    )
    .await?;
    db::insert_resolved_edge(tx, actor, &outcome.work_item_id, outcome.timestamp).await?;
    db::decrement_active_items(tx, actor).await?;

    updates.push(StatUpdate {
        human_id: actor.clone(),
        service: outcome.service.clone(),
        fit_score: db::fit_score_tx(tx, actor, &outcome.service).await?,
        change: "resolved",
    });
    Ok(())
}

async fn apply_reassigned(
    state: &AppState,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    outcome: &Outcome,
    original_assignee: Option<&str>,
    new_assignee: &str,
    updates: &mut Vec<StatUpdate>,
) -> Result<()> {
    if let Some(original) = original_assignee {
        db::ensure_human_tx(tx, original).await?;
        db::apply_transfer_penalty(
            tx,
            original,
            &outcome.service,
            state.config.reassign_fit_penalty,
        )
        .await?;
        updates.push(StatUpdate {
            human_id: original.to_string(),
            service: outcome.service.clone(),
            fit_score: db::fit_score_tx(tx, original, &outcome.service).await?,
            change: "transfer_penalty",
        });
    } else {
        warn!(
            work_item_id = %outcome.work_item_id,
            "original assignee unknown, applying only the new-assignee update"
        );
    }

    db::ensure_human_tx(tx, new_assignee).await?;
    db::apply_accept_boost(tx, new_assignee, &outcome.service, state.config.accept_fit_boost)
        .await?;
    updates.push(StatUpdate {
        human_id: new_assignee.to_string(),
        service: outcome.service.clone(),
        fit_score: db::fit_score_tx(tx, new_assignee, &outcome.service).await?,
        change: "accept_boost",
    });

    if let Some(original) = original_assignee {
        db::insert_transferred_edge(
            tx,
            &outcome.work_item_id,
            original,
            new_assignee,
            outcome.timestamp,
        )
        .await?;
    }
    Ok(())
}

/// Original assignee carried by the event itself: the explicit field, or
/// the acting user when they are not also the new assignee.
fn explicit_original_assignee(outcome: &Outcome) -> Option<String> {
    if let Some(original) = &outcome.original_assignee_id {
        return Some(original.clone());
    }
    match &outcome.new_assignee_id {
        Some(new_assignee) if new_assignee != &outcome.actor_id => {
            Some(outcome.actor_id.clone())
        }
        _ => None,
    }
}

/// Who was the work item taken away from? Falls back to the Decision
/// read-only port when the event does not say.
async fn resolve_original_assignee(state: &AppState, outcome: &Outcome) -> Option<String> {
    if let Some(original) = explicit_original_assignee(outcome) {
        return Some(original);
    }
    state
        .decision
        .decision_for_work_item(&outcome.work_item_id)
        .await
        .map(|d| d.primary_human_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reassigned(actor: &str, new: Option<&str>, original: Option<&str>) -> Outcome {
        Outcome {
            event_id: "evt-1".to_string(),
            work_item_id: "wi-1".to_string(),
            decision_id: None,
            kind: OutcomeType::Reassigned,
            actor_id: actor.to_string(),
            original_assignee_id: original.map(|s| s.to_string()),
            new_assignee_id: new.map(|s| s.to_string()),
            service: "api".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn explicit_field_wins() {
        let outcome = reassigned("h2", Some("h2"), Some("h1"));
        assert_eq!(explicit_original_assignee(&outcome), Some("h1".to_string()));
    }

    #[test]
    fn actor_is_original_when_someone_else_receives() {
        let outcome = reassigned("h1", Some("h2"), None);
        assert_eq!(explicit_original_assignee(&outcome), Some("h1".to_string()));
    }

    #[test]
    fn self_assignment_leaves_the_original_unknown() {
        // The new assignee grabbed the item; only the decision record knows
        // who held it before.
        let outcome = reassigned("h2", Some("h2"), None);
        assert_eq!(explicit_original_assignee(&outcome), None);

        let outcome = reassigned("h2", None, None);
        assert_eq!(explicit_original_assignee(&outcome), None);
    }
}
