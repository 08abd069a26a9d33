//! Pre-execution mapping resolution: service to tracker project, severity to
//! tracker priority, human to tracker account id. All three must resolve
//! before any tracker call is made.

use routing_common::{AppError, Result};
use routing_models::Severity;
use sqlx::PgPool;
use tracing::warn;

/// Default service-to-project table. Per-service env overrides
/// (`SERVICE_<NAME>_PROJECT`) win; unmapped services fall back to the
/// uppercased service tag.
const SERVICE_PROJECT_MAP: &[(&str, &str)] = &[
    ("api", "API"),
    ("frontend", "FE"),
    ("backend", "BE"),
    ("infrastructure", "INFRA"),
    ("data", "DATA"),
    ("mobile", "MOBILE"),
];

pub fn tracker_project(service: &str) -> String {
    let service_lower = service.to_lowercase();

    let env_key = format!(
        "SERVICE_{}_PROJECT",
        service_lower.to_uppercase().replace('-', "_")
    );
    if let Ok(project) = std::env::var(&env_key) {
        if !project.is_empty() {
            return project;
        }
    }

    if let Some((_, project)) = SERVICE_PROJECT_MAP
        .iter()
        .find(|(name, _)| *name == service_lower)
    {
        return project.to_string();
    }

    warn!(%service, "no project mapping found, using the uppercased service tag");
    service.to_uppercase()
}

pub fn tracker_priority(severity: &str) -> Result<String> {
    let severity: Severity = severity
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("cannot map severity to priority: {}", e)))?;
    Ok(severity.tracker_priority().to_string())
}

pub async fn tracker_account_id(pool: &PgPool, human_id: &str) -> Result<String> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT tracker_account_id FROM humans WHERE id = $1")
            .bind(human_id)
            .fetch_optional(pool)
            .await?;

    row.and_then(|(account_id,)| account_id)
        .filter(|account_id| !account_id.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "No tracker account id found for human '{}'. Cannot create tracker issue.",
                human_id
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_services_map_to_their_projects() {
        assert_eq!(tracker_project("api"), "API");
        assert_eq!(tracker_project("frontend"), "FE");
        assert_eq!(tracker_project("infrastructure"), "INFRA");
    }

    #[test]
    fn unknown_services_fall_back_to_uppercase() {
        assert_eq!(tracker_project("payments"), "PAYMENTS");
    }

    #[test]
    fn mapping_is_case_insensitive() {
        assert_eq!(tracker_project("API"), "API");
        assert_eq!(tracker_project("Mobile"), "MOBILE");
    }

    #[test]
    fn severities_map_to_priorities() {
        assert_eq!(tracker_priority("sev1").unwrap(), "Critical");
        assert_eq!(tracker_priority("sev2").unwrap(), "High");
        assert_eq!(tracker_priority("sev3").unwrap(), "Medium");
        assert_eq!(tracker_priority("sev4").unwrap(), "Low");
    }

    #[test]
    fn unknown_severity_is_an_input_error() {
        assert!(matches!(
            tracker_priority("sev9"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
