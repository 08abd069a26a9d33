//! Narrow read-only port on the Decision service, used to recover the
//! original assignee of a reassigned work item. No writes flow backward.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionSummary {
    pub id: String,
    pub work_item_id: String,
    pub primary_human_id: String,
    #[serde(default)]
    pub backup_human_ids: Vec<String>,
}

pub struct DecisionClient {
    base_url: String,
    client: reqwest::Client,
}

impl DecisionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Best-effort lookup; any failure (timeout, 404, 5xx) degrades to None.
    pub async fn decision_for_work_item(&self, work_item_id: &str) -> Option<DecisionSummary> {
        let url = format!("{}/decisions/{}", self.base_url, work_item_id);
        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(%work_item_id, "decision lookup failed: {}", err);
                return None;
            }
        };

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return None;
        }
        if !response.status().is_success() {
            warn!(%work_item_id, status = %response.status(), "decision lookup returned error");
            return None;
        }

        match response.json::<DecisionSummary>().await {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(%work_item_id, "failed to parse decision summary: {}", err);
                None
            }
        }
    }
}
