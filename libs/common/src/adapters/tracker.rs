//! Ticket tracker adapter.
//!
//! Execute creates actionable tickets here; Learner reads capacity and
//! on-call signals and bootstraps stats from closed issues. Searches go
//! through a small typed query AST instead of hand-built query strings.

use super::{AdapterConfig, ExternalAdapter};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Payload for issue creation.
#[derive(Debug, Clone, Serialize)]
pub struct NewTrackerIssue {
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub priority: String,
    pub assignee_account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

/// Flattened issue shape returned by search.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerIssue {
    pub id: String,
    pub key: String,
    pub project: String,
    pub summary: String,
    pub assignee_account_id: Option<String>,
    pub assignee_display_name: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub resolution_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePage {
    pub issues: Vec<TrackerIssue>,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryPointCapacity {
    pub max_story_points: i32,
    pub current_story_points: i32,
}

impl Default for StoryPointCapacity {
    fn default() -> Self {
        Self {
            max_story_points: 21,
            current_story_points: 0,
        }
    }
}

/// Fields the query AST can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Project,
    Status,
    Assignee,
}

impl QueryField {
    fn as_str(&self) -> &'static str {
        match self {
            QueryField::Project => "project",
            QueryField::Status => "status",
            QueryField::Assignee => "assignee",
        }
    }
}

#[derive(Debug, Clone)]
enum Term {
    Eq(QueryField, String),
    ResolvedWithinDays(u32),
}

/// Typed query rendering to the tracker's query language. Terms are joined
/// with AND; values are quoted with embedded quotes escaped.
#[derive(Debug, Clone, Default)]
pub struct TrackerQuery {
    terms: Vec<Term>,
}

impl TrackerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: QueryField, value: impl Into<String>) -> Self {
        self.terms.push(Term::Eq(field, value.into()));
        self
    }

    pub fn resolved_within_days(mut self, days: u32) -> Self {
        self.terms.push(Term::ResolvedWithinDays(days));
        self
    }

    pub fn render(&self) -> String {
        let rendered: Vec<String> = self
            .terms
            .iter()
            .map(|term| match term {
                Term::Eq(field, value) => {
                    format!("{} = \"{}\"", field.as_str(), value.replace('"', "\\\""))
                }
                Term::ResolvedWithinDays(days) => format!("resolved >= -{}d", days),
            })
            .collect();
        rendered.join(" AND ")
    }
}

impl fmt::Display for TrackerQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[automock]
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Create an issue. 5xx/429/transport failures surface as
    /// DependencyUnavailable (retryable by the caller's policy); other 4xx
    /// surface as InvalidInput and must not be retried.
    async fn create_issue(&self, issue: NewTrackerIssue) -> Result<CreatedIssue>;

    async fn transition_issue(&self, key: &str, target_state: &str) -> Result<()>;

    async fn search_issues(
        &self,
        query: &TrackerQuery,
        start_at: i64,
        max_results: i64,
    ) -> Result<IssuePage>;

    async fn user_story_points(&self, account_id: &str) -> Result<StoryPointCapacity>;

    async fn user_on_call(&self, account_id: &str) -> Result<bool>;

    async fn user_resolved_by_severity(
        &self,
        account_id: &str,
        project: &str,
        days: u32,
    ) -> Result<HashMap<String, i64>>;
}

/// HTTP client for the tracker.
pub struct HttpTracker {
    config: AdapterConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TransitionRequest<'a> {
    target_state: &'a str,
}

#[derive(Debug, Deserialize)]
struct OnCallResponse {
    on_call: bool,
}

impl HttpTracker {
    pub fn new(config: AdapterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    fn classify_status(status: reqwest::StatusCode, body: String) -> AppError {
        if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
            AppError::InvalidInput(format!("tracker rejected request ({}): {}", status, body))
        } else {
            AppError::DependencyUnavailable(format!("tracker returned {}: {}", status, body))
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("tracker request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse tracker response: {}", e))
        })
    }
}

#[async_trait]
impl Tracker for HttpTracker {
    async fn create_issue(&self, issue: NewTrackerIssue) -> Result<CreatedIssue> {
        let url = format!("{}/rest/api/3/issue", self.config.base_url);
        let response = self
            .authorized(self.client.post(&url).json(&issue))
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("tracker request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        response.json().await.map_err(|e| {
            AppError::DependencyUnavailable(format!("failed to parse created issue: {}", e))
        })
    }

    async fn transition_issue(&self, key: &str, target_state: &str) -> Result<()> {
        let url = format!("{}/rest/api/3/issue/{}/transitions", self.config.base_url, key);
        let response = self
            .authorized(self.client.post(&url).json(&TransitionRequest { target_state }))
            .send()
            .await
            .map_err(|e| AppError::DependencyUnavailable(format!("tracker request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }
        Ok(())
    }

    async fn search_issues(
        &self,
        query: &TrackerQuery,
        start_at: i64,
        max_results: i64,
    ) -> Result<IssuePage> {
        let url = format!(
            "{}/rest/api/3/search?query={}&start_at={}&max_results={}",
            self.config.base_url,
            urlencode(&query.render()),
            start_at,
            max_results
        );
        self.get_json(&url).await
    }

    async fn user_story_points(&self, account_id: &str) -> Result<StoryPointCapacity> {
        let url = format!("{}/users/{}/story_points", self.config.base_url, account_id);
        self.get_json(&url).await
    }

    async fn user_on_call(&self, account_id: &str) -> Result<bool> {
        let url = format!("{}/users/{}/on_call", self.config.base_url, account_id);
        let body: OnCallResponse = self.get_json(&url).await?;
        Ok(body.on_call)
    }

    async fn user_resolved_by_severity(
        &self,
        account_id: &str,
        project: &str,
        days: u32,
    ) -> Result<HashMap<String, i64>> {
        let url = format!(
            "{}/users/{}/resolved_by_severity?project={}&days={}",
            self.config.base_url,
            account_id,
            urlencode(project),
            days
        );
        self.get_json(&url).await
    }
}

#[async_trait]
impl ExternalAdapter for HttpTracker {
    fn service_name(&self) -> &'static str {
        "tracker"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

/// Minimal percent-encoding for query-string values.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_renders_terms_joined_with_and() {
        let query = TrackerQuery::new()
            .eq(QueryField::Project, "API")
            .eq(QueryField::Status, "Done")
            .resolved_within_days(90);
        assert_eq!(
            query.render(),
            "project = \"API\" AND status = \"Done\" AND resolved >= -90d"
        );
    }

    #[test]
    fn query_escapes_embedded_quotes() {
        let query = TrackerQuery::new().eq(QueryField::Project, "A\"B");
        assert_eq!(query.render(), "project = \"A\\\"B\"");
    }

    #[test]
    fn empty_query_renders_empty_string() {
        assert_eq!(TrackerQuery::new().render(), "");
    }

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("a b=\"c\""), "a%20b%3D%22c%22");
        assert_eq!(urlencode("plain-text_1.0~x"), "plain-text_1.0~x");
    }

    #[test]
    fn default_capacity_matches_sprint_defaults() {
        let cap = StoryPointCapacity::default();
        assert_eq!(cap.max_story_points, 21);
        assert_eq!(cap.current_story_points, 0);
    }
}
