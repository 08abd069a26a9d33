//! Inbound alerting webhook: incident events become work items through the
//! canonical creation path. Urgency maps to severity; unknown service names
//! fall through to their lowercased literal.

use crate::services::creation::{create_work_item, CreateWorkItem};
use crate::state::AppState;
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use hmac::{Hmac, Mac};
use routing_common::{AppError, Result};
use routing_models::{Severity, WorkItemType};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

const HANDLED_EVENT_TYPES: &[&str] = &["incident.triggered", "incident.created"];

/// Alerting-platform service name to routing service tag.
const SERVICE_MAP: &[(&str, &str)] = &[
    ("api-service", "api"),
    ("frontend-service", "frontend"),
    ("backend-service", "backend"),
    ("infrastructure", "infrastructure"),
    ("data-service", "data"),
    ("mobile-service", "mobile"),
];

#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub event: Option<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub incident: Option<WebhookIncident>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookIncident {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub incident_number: Option<serde_json::Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub urgency: String,
    #[serde(default)]
    pub service: Option<WebhookService>,
    #[serde(default)]
    pub body: Option<WebhookBody>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookService {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub details: String,
}

pub fn map_service(name: &str) -> String {
    let lower = name.to_lowercase();
    if let Some((_, mapped)) = SERVICE_MAP.iter().find(|(from, _)| *from == lower) {
        return mapped.to_string();
    }
    warn!(service = %name, "no service mapping found, using lowercased name");
    lower
}

pub fn map_urgency(urgency: &str, high: &str, low: &str) -> Severity {
    let parsed = match urgency.to_lowercase().as_str() {
        "high" => high.parse::<Severity>(),
        "low" => low.parse::<Severity>(),
        other => {
            warn!(urgency = %other, "unknown urgency, defaulting to sev3");
            Ok(Severity::Sev3)
        }
    };
    parsed.unwrap_or(Severity::Sev3)
}

/// HMAC-SHA256 over the raw body, hex-encoded. Verification is skipped when
/// no secret is configured.
pub fn verify_signature(secret: Option<&str>, body: &[u8], signature: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(signature) = signature else {
        return false;
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = hex_encode(&mac.finalize().into_bytes());
    // Signatures come hex-encoded, optionally prefixed.
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    expected.eq_ignore_ascii_case(signature)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[post("/webhooks/incoming")]
pub async fn incoming(
    state: web::Data<AppState>,
    request: HttpRequest,
    body: web::Bytes,
) -> Result<impl Responder> {
    let signature = request
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());
    if !verify_signature(state.config.webhook_secret.as_deref(), &body, signature) {
        warn!("invalid webhook signature");
        return Err(AppError::Unauthorized("invalid webhook signature".to_string()));
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("malformed webhook payload: {}", e)))?;

    let Some(event) = envelope.event else {
        return Err(AppError::InvalidInput("missing event in payload".to_string()));
    };
    if !HANDLED_EVENT_TYPES.contains(&event.event_type.as_str()) {
        info!(event_type = %event.event_type, "ignoring unhandled webhook event type");
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "status": "skipped",
            "message": format!("Event type {} not handled", event.event_type),
        })));
    }

    let Some(incident) = event.data.and_then(|d| d.incident) else {
        return Err(AppError::InvalidInput("no incident data in payload".to_string()));
    };
    if incident.id.is_empty() {
        return Err(AppError::InvalidInput("no incident id in payload".to_string()));
    }

    let service_name = incident
        .service
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("unknown");
    let service = map_service(service_name);
    let severity = map_urgency(
        &incident.urgency,
        &state.config.high_urgency_severity,
        &state.config.low_urgency_severity,
    );

    let details = incident.body.as_ref().map(|b| b.details.clone()).unwrap_or_default();
    let description = if details.is_empty() {
        incident.title.clone()
    } else {
        format!("{}\n\n{}", incident.title, details)
    };

    let incident_number = incident
        .incident_number
        .as_ref()
        .map(|n| n.to_string().trim_matches('"').to_string())
        .unwrap_or_else(|| incident.id.clone());

    let work_item = create_work_item(
        state.get_ref(),
        CreateWorkItem {
            kind: WorkItemType::Incident,
            service: service.clone(),
            severity,
            description,
            raw_log: (!details.is_empty()).then_some(details),
            origin_system: format!("WEBHOOK-{}", incident_number),
            creator_id: None,
            story_points: None,
            impact: None,
        },
    )
    .await?;

    info!(
        incident_number = %incident_number,
        work_item_id = %work_item.id,
        "webhook incident ingested"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "work_item_id": work_item.id,
        "incident_id": incident.id,
        "incident_number": incident_number,
        "service": service,
        "severity": severity,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_service_names_map_to_tags() {
        assert_eq!(map_service("api-service"), "api");
        assert_eq!(map_service("Frontend-Service"), "frontend");
    }

    #[test]
    fn unknown_service_names_fall_through_lowercased() {
        assert_eq!(map_service("Payments-Platform"), "payments-platform");
    }

    #[test]
    fn urgency_maps_to_configured_severities() {
        assert_eq!(map_urgency("high", "sev2", "sev3"), Severity::Sev2);
        assert_eq!(map_urgency("LOW", "sev2", "sev3"), Severity::Sev3);
        assert_eq!(map_urgency("weird", "sev2", "sev3"), Severity::Sev3);
        // Configurable mapping.
        assert_eq!(map_urgency("high", "sev1", "sev4"), Severity::Sev1);
    }

    #[test]
    fn signature_check_is_skipped_without_a_secret() {
        assert!(verify_signature(None, b"payload", None));
    }

    #[test]
    fn signature_check_requires_a_matching_mac() {
        let secret = "webhook-secret";
        let body = b"{\"event\":{}}";

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let valid = hex_encode(&mac.finalize().into_bytes());

        assert!(verify_signature(Some(secret), body, Some(&valid)));
        assert!(verify_signature(
            Some(secret),
            body,
            Some(&format!("sha256={}", valid))
        ));
        assert!(!verify_signature(Some(secret), body, Some("deadbeef")));
        assert!(!verify_signature(Some(secret), body, None));
    }
}
