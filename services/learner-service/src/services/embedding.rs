//! Capability-embedding refresh.
//!
//! After a resolution, the responder's capability vector for the service is
//! rebuilt from their most recent resolved items: embed each description,
//! take the recency-weighted centroid, L2-normalize, project to 3-D with the
//! shared model, and mirror the full vector into the nearest-neighbor index.

use crate::db::{self, ResolvedItem};
use crate::state::AppState;
use routing_common::projection::recency_weighted_centroid;
use routing_common::Result;
use std::collections::HashMap;
use tracing::{info, warn};

pub async fn refresh_capability_embedding(state: AppState, human_id: String, service: String) {
    if let Err(err) = refresh_inner(&state, &human_id, &service).await {
        warn!(%human_id, %service, "capability embedding refresh failed: {}", err);
    }
}

async fn refresh_inner(state: &AppState, human_id: &str, service: &str) -> Result<()> {
    let items = db::resolved_work_items(
        &state.pool,
        human_id,
        service,
        state.config.embedding_history_limit,
    )
    .await?;
    if items.is_empty() {
        return Ok(());
    }

    let mut embeddings = Vec::with_capacity(items.len());
    for item in &items {
        if item.description.trim().is_empty() {
            continue;
        }
        match state.language_model.embed(&item.description).await {
            Ok(embedding) => embeddings.push(embedding),
            Err(err) => {
                warn!(work_item_id = %item.work_item_id, "embedding failed, skipping item: {}", err)
            }
        }
    }
    if embeddings.is_empty() {
        return Ok(());
    }

    let centroid = recency_weighted_centroid(&embeddings);
    let (x, y, z) = state.projector.project(&centroid);
    db::update_human_coords(&state.pool, human_id, x, y, z).await?;

    let display_name = db::get_human(&state.pool, human_id)
        .await?
        .map(|h| h.display_name)
        .unwrap_or_else(|| human_id.to_string());

    let mut properties = HashMap::new();
    properties.insert("human_id".to_string(), human_id.to_string());
    properties.insert("service".to_string(), service.to_string());
    properties.insert("display_name".to_string(), display_name);
    properties.insert(
        "capability_summary".to_string(),
        capability_summary(service, &items),
    );

    state
        .vector_index
        .upsert(&format!("{}::{}", human_id, service), &centroid, properties)
        .await?;

    info!(%human_id, %service, items = items.len(), "capability embedding refreshed");
    Ok(())
}

/// Short free-text summary of what the human has been resolving in this
/// service, stored as an index property for operators browsing the
/// capability map.
fn capability_summary(service: &str, items: &[ResolvedItem]) -> String {
    if items.is_empty() {
        return "No resolved items yet".to_string();
    }

    let mut descriptions = Vec::new();
    for item in items.iter().take(10) {
        let desc = item.description.trim();
        if !desc.is_empty() {
            descriptions.push(truncate(desc, 200));
        }
    }

    let mut parts = vec![format!("Works on: {}", service)];
    if !descriptions.is_empty() {
        parts.push(format!(
            "Recent work: {}",
            truncate(&descriptions.join(" "), 500)
        ));
    }
    parts.join(". ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(description: &str) -> ResolvedItem {
        ResolvedItem {
            work_item_id: "wi-1".to_string(),
            resolved_at: Utc::now(),
            description: description.to_string(),
        }
    }

    #[test]
    fn summary_names_the_service_and_recent_work() {
        let items = vec![item("500s on /v1/users"), item("timeouts on /v1/orders")];
        let summary = capability_summary("api", &items);
        assert!(summary.contains("Works on: api"));
        assert!(summary.contains("500s on /v1/users"));
        assert!(summary.contains("timeouts on /v1/orders"));
    }

    #[test]
    fn summary_for_no_items_is_explicit() {
        assert_eq!(capability_summary("api", &[]), "No resolved items yet");
    }

    #[test]
    fn empty_descriptions_leave_only_the_service_line() {
        let summary = capability_summary("api", &[item("  ")]);
        assert_eq!(summary, "Works on: api");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
    }
}
