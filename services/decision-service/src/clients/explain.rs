use routing_common::{AppError, Result};
use routing_models::{ExplainDecisionRequest, ExplainDecisionResponse};
use std::time::Duration;

pub struct ExplainClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExplainClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Explanation rides on the language model, so it gets the same
        // generous timeout.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn explain(
        &self,
        request: &ExplainDecisionRequest,
    ) -> Result<ExplainDecisionResponse> {
        let url = format!("{}/explain", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("explain request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "explain returned status: {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse explain response: {}", e))
        })
    }
}
