//! The canonical work-item creation path: normalize the description, embed
//! it, project to 3-D, persist, mirror into the vector index, then trigger
//! the decision. Every inbound source (API, webhook) funnels through here.

use crate::db::{self, NewWorkItem};
use crate::services::normalize;
use crate::state::AppState;
use chrono::Utc;
use routing_common::utils::generate_prefixed_id;
use routing_common::Result;
use routing_models::{Severity, WorkItem, WorkItemType};
use std::collections::HashMap;
use tracing::{info, warn};

pub struct CreateWorkItem {
    pub kind: WorkItemType,
    pub service: String,
    pub severity: Severity,
    pub description: String,
    pub raw_log: Option<String>,
    pub origin_system: String,
    pub creator_id: Option<String>,
    pub story_points: Option<i32>,
    pub impact: Option<String>,
}

/// Create and persist a work item, then kick the decision path. The row is
/// committed before the trigger fires; a trigger failure leaves the item
/// persisted and routable later.
pub async fn create_work_item(state: &AppState, input: CreateWorkItem) -> Result<WorkItem> {
    let work_item_id = generate_prefixed_id("wi");
    let created_at = Utc::now();

    let description = normalize::clean_description(
        state,
        &input.description,
        input.raw_log.as_deref(),
        &input.service,
    )
    .await;

    // Embedding failures degrade: the item persists without coordinates and
    // never enters the index.
    let embedding = match state.language_model.embed(&description).await {
        Ok(vector) => Some(vector),
        Err(err) => {
            warn!(%work_item_id, "embedding failed ({}), persisting without projection", err);
            None
        }
    };
    let projection = embedding.as_ref().map(|v| state.projector.project(v));

    db::insert_work_item(
        &state.pool,
        &NewWorkItem {
            id: work_item_id.clone(),
            kind: input.kind.as_str().to_string(),
            service: input.service.clone(),
            severity: input.severity.as_str().to_string(),
            description: description.clone(),
            raw_log: input.raw_log.clone(),
            embedding: projection,
            created_at,
            origin_system: input.origin_system.clone(),
            creator_id: input.creator_id.clone(),
            story_points: input.story_points,
            impact: input.impact.clone(),
        },
    )
    .await?;

    info!(%work_item_id, service = %input.service, "work item created");

    if let Some(vector) = &embedding {
        let mut properties = HashMap::new();
        properties.insert("service".to_string(), input.service.clone());
        properties.insert("severity".to_string(), input.severity.as_str().to_string());
        properties.insert("description".to_string(), description.clone());
        if let Err(err) = state
            .vector_index
            .upsert(&work_item_id, vector, properties)
            .await
        {
            warn!(%work_item_id, "vector index upsert failed: {}", err);
        }
    }

    // Best-effort, bounded, no retry: the decision is idempotent on
    // work_item_id and can be re-triggered later.
    match state.decision.trigger(&work_item_id).await {
        Ok(Some(primary)) => {
            info!(%work_item_id, %primary, "decision triggered")
        }
        Ok(None) => {}
        Err(err) => {
            warn!(%work_item_id, "decision trigger failed ({}), work item created but not routed", err)
        }
    }

    Ok(WorkItem {
        id: work_item_id,
        kind: input.kind.as_str().to_string(),
        service: input.service,
        severity: input.severity.as_str().to_string(),
        description,
        raw_log: input.raw_log,
        embedding_x: projection.map(|p| p.0),
        embedding_y: projection.map(|p| p.1),
        embedding_z: projection.map(|p| p.2),
        created_at,
        origin_system: input.origin_system,
        creator_id: input.creator_id,
        tracker_issue_key: None,
        story_points: input.story_points,
        impact: input.impact,
    })
}
