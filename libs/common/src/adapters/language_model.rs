//! Language-model provider adapter.
//!
//! The model is never a source of truth: every completion runs at
//! temperature 0, optionally constrained by a JSON schema, and callers keep a
//! deterministic fallback for any transport or parse failure. The same
//! adapter also produces the fixed-dimensional description embeddings.

use super::{AdapterConfig, ExternalAdapter};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// A deterministic completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn deterministic(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.0,
            json_schema: None,
        }
    }

    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

#[automock]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Text completion at temperature 0.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Dense embedding of `text`. The dimensionality is fixed at startup.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// HTTP client for the language-model adapter service.
pub struct HttpLanguageModel {
    config: AdapterConfig,
    client: reqwest::Client,
    embedding_dims: usize,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

impl HttpLanguageModel {
    pub fn new(config: AdapterConfig, embedding_dims: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            embedding_dims,
        })
    }

    pub fn embedding_dims(&self) -> usize {
        self.embedding_dims
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/v1/complete", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url).json(&request))
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("language model request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "language model returned status: {}",
                response.status()
            )));
        }

        let body: CompletionResponse = response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!(
                "failed to parse language model response: {}",
                e
            ))
        })?;
        Ok(body.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url).json(&EmbeddingRequest { text }))
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("embedding request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "embedding endpoint returned status: {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse embedding response: {}", e))
        })?;

        if body.embedding.len() != self.embedding_dims {
            return Err(AppError::DependencyUnavailable(format!(
                "embedding dimensionality mismatch: got {}, expected {}",
                body.embedding.len(),
                self.embedding_dims
            )));
        }
        Ok(body.embedding)
    }
}

#[async_trait]
impl ExternalAdapter for HttpLanguageModel {
    fn service_name(&self) -> &'static str {
        "language-model"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_requests_pin_temperature_to_zero() {
        let req = CompletionRequest::deterministic("system", "prompt");
        assert_eq!(req.temperature, 0.0);
        assert!(req.json_schema.is_none());
    }

    #[test]
    fn schema_is_serialized_only_when_present() {
        let without = CompletionRequest::deterministic("s", "p");
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("json_schema").is_none());

        let with = CompletionRequest::deterministic("s", "p")
            .with_json_schema(serde_json::json!({"type": "object"}));
        let json = serde_json::to_value(&with).unwrap();
        assert_eq!(json["json_schema"]["type"], "object");
    }
}
