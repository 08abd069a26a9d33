use routing_common::{AppError, Result};
use routing_models::{ExecuteDecisionRequest, ExecuteDecisionResponse};
use std::time::Duration;

pub struct ExecuteClient {
    base_url: String,
    client: reqwest::Client,
}

impl ExecuteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Execution retries the tracker internally, so the end-to-end call
        // can legitimately outlive a single write timeout.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn execute(
        &self,
        request: &ExecuteDecisionRequest,
    ) -> Result<ExecuteDecisionResponse> {
        let url = format!("{}/execute", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("execute request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "execute returned status: {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse execute response: {}", e))
        })
    }
}
