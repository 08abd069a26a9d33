//! Post-commit decision trigger. Bounded, best-effort, no retry: the
//! decision endpoint is idempotent on work_item_id, so a missed trigger
//! only delays routing.

use routing_common::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct DecideRequest<'a> {
    work_item_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DecideResponse {
    #[serde(default)]
    primary_human_id: Option<String>,
}

pub struct DecisionTrigger {
    base_url: String,
    client: reqwest::Client,
}

impl DecisionTrigger {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the chosen primary on success.
    pub async fn trigger(&self, work_item_id: &str) -> Result<Option<String>> {
        let url = format!("{}/decide", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DecideRequest { work_item_id })
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("decision trigger failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "decision returned status: {}",
                response.status()
            )));
        }

        let body: DecideResponse = response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse decision response: {}", e))
        })?;
        Ok(body.primary_human_id)
    }
}
