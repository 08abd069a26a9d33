//! Outcome forwarding to the Learner. The local audit row is already
//! committed when this fires; forwarding failures are logged, not surfaced.

use routing_common::{AppError, Result};
use routing_models::Outcome;
use std::time::Duration;

pub struct LearnerForwarder {
    base_url: String,
    client: reqwest::Client,
}

impl LearnerForwarder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn forward_outcome(&self, outcome: &Outcome) -> Result<()> {
        let url = format!("{}/outcomes", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(outcome)
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("outcome forward failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "learner returned status: {}",
                response.status()
            )));
        }
        Ok(())
    }
}
