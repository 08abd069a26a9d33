use routing_common::{AppError, Result};
use routing_models::CandidateProfile;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    #[serde(default)]
    humans: Vec<CandidateProfile>,
}

pub struct LearnerClient {
    base_url: String,
    client: reqwest::Client,
}

impl LearnerClient {
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

    pub async fn get_profiles(&self, service: &str) -> Result<Vec<CandidateProfile>> {
        let url = format!("{}/profiles", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("service", service)])
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("learner request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "learner returned status: {}",
                response.status()
            )));
        }

        let body: ProfilesResponse = response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse learner response: {}", e))
        })?;
        Ok(body.humans)
    }
}
