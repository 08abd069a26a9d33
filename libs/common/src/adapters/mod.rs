//! External collaborator adapters.
//!
//! The core talks to the ticket tracker, the language-model provider, and the
//! nearest-neighbor index only through the thin clients in this module. Each
//! adapter is a trait so services can be tested against mocks, with a reqwest
//! implementation wired by the composition root at startup.

pub mod language_model;
pub mod tracker;
pub mod vector_index;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Common trait for all external adapters.
#[async_trait]
pub trait ExternalAdapter: Send + Sync {
    /// Name of the external collaborator.
    fn service_name(&self) -> &'static str;

    /// Check if the collaborator is reachable.
    async fn health_check(&self) -> Result<bool>;
}

/// Connection settings for one external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Base URL of the external service
    pub base_url: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Number of retry attempts for callers that retry
    pub retry_count: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_ms: 30000,
            retry_count: 3,
        }
    }
}

impl AdapterConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.retry_count, 3);
        assert!(config.api_key.is_none());
    }
}
