//! Nearest-neighbor index adapter.
//!
//! Work items and responder capability vectors are mirrored into an external
//! vector index. Cosine distances come back in [0, 2] and are converted to a
//! [0, 1] similarity before anything downstream sees them.

use super::{AdapterConfig, ExternalAdapter};
use crate::error::{AppError, Result};
use crate::utils::clamp01;
use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One search hit from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub properties: HashMap<String, String>,
    pub distance: f64,
    pub similarity: f64,
}

impl Neighbor {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }
}

/// Property equality filter applied server-side during search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilter {
    pub field: String,
    pub value: String,
}

impl SearchFilter {
    pub fn service(value: impl Into<String>) -> Self {
        Self {
            field: "service".to_string(),
            value: value.into(),
        }
    }
}

/// Cosine distance in [0, 2] mapped to similarity in [0, 1].
pub fn similarity_from_distance(distance: f64) -> f64 {
    clamp01(1.0 - distance / 2.0)
}

#[automock]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(
        &self,
        id: &str,
        vector: &[f64],
        properties: HashMap<String, String>,
    ) -> Result<()>;

    async fn search(
        &self,
        vector: &[f64],
        filter: Option<SearchFilter>,
        limit: usize,
    ) -> Result<Vec<Neighbor>>;
}

/// HTTP client for the vector index adapter service.
pub struct HttpVectorIndex {
    config: AdapterConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    id: &'a str,
    vector: &'a [f64],
    properties: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<SearchFilter>,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    #[serde(default)]
    properties: HashMap<String, String>,
    distance: f64,
}

impl HttpVectorIndex {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(
        &self,
        id: &str,
        vector: &[f64],
        properties: HashMap<String, String>,
    ) -> Result<()> {
        let url = format!("{}/v1/objects", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&UpsertRequest {
                id,
                vector,
                properties,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("vector index upsert failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "vector index returned status: {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f64],
        filter: Option<SearchFilter>,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        let url = format!("{}/v1/search", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                vector,
                filter,
                limit,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::DependencyUnavailable(format!("vector index search failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::DependencyUnavailable(format!(
                "vector index returned status: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse search response: {}", e))
        })?;

        Ok(body
            .results
            .into_iter()
            .map(|hit| Neighbor {
                similarity: similarity_from_distance(hit.distance),
                id: hit.id,
                properties: hit.properties,
                distance: hit.distance,
            })
            .collect())
    }
}

#[async_trait]
impl ExternalAdapter for HttpVectorIndex {
    fn service_name(&self) -> &'static str {
        "vector-index"
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
    fn similarity_maps_cosine_distance_range() {
        assert_eq!(similarity_from_distance(0.0), 1.0);
        assert_eq!(similarity_from_distance(1.0), 0.5);
        assert_eq!(similarity_from_distance(2.0), 0.0);
        // Out-of-contract distances clamp instead of escaping [0, 1].
        assert_eq!(similarity_from_distance(-0.5), 1.0);
        assert_eq!(similarity_from_distance(3.0), 0.0);
    }

    #[test]
    fn neighbor_property_ignores_empty_values() {
        let mut props = HashMap::new();
        props.insert("resolver_id".to_string(), "".to_string());
        props.insert("service".to_string(), "api".to_string());
        let neighbor = Neighbor {
            id: "wi-1".into(),
            properties: props,
            distance: 0.4,
            similarity: 0.8,
        };
        assert_eq!(neighbor.property("service"), Some("api"));
        assert_eq!(neighbor.property("resolver_id"), None);
        assert_eq!(neighbor.property("missing"), None);
    }
}
