//! Evidence generation.
//!
//! The language model is a formatting layer over structured features, never
//! a source of truth: the prompt lists the candidate features verbatim and
//! forbids claims outside them, the call runs at temperature 0 against a
//! strict JSON schema, and any transport or validation failure falls back to
//! deterministic templates over the same features.

use routing_common::{AppError, Result};
use routing_models::{CandidateFeatures, ConstraintCheck, Evidence, EvidenceKind, WorkItemSummary};
use serde::Deserialize;

/// JSON schema the model's response must satisfy.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["evidence", "why_not_next_best"],
        "properties": {
            "evidence": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["type", "text", "time_window", "source"],
                    "properties": {
                        "type": {"type": "string"},
                        "text": {"type": "string"},
                        "time_window": {"type": "string"},
                        "source": {"type": "string"}
                    }
                }
            },
            "why_not_next_best": {"type": "string"}
        }
    })
}

pub const SYSTEM_PROMPT: &str =
    "You are a factual evidence generator for assignment decisions. Use only the \
     features provided in the prompt; never invent numbers, time windows, or \
     global claims. Always return valid JSON.";

fn format_features(label: &str, features: &CandidateFeatures) -> String {
    format!(
        "{label}: {display} ({id})\n\
         - Fit Score: {fit:.2}\n\
         - Resolves (last 90 days): {resolves}\n\
         - Transfers (last 90 days): {transfers}\n\
         - Last Resolved: {last}\n\
         - On Call: {on_call}\n\
         - Pages (7 days): {pages}\n\
         - Active Items: {active}\n\
         - Similar Incident Score: {similar}\n",
        label = label,
        display = features.display_name,
        id = features.human_id,
        fit = features.fit_score,
        resolves = features.resolves_count,
        transfers = features.transfers_count,
        last = features
            .last_resolved_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "Never".to_string()),
        on_call = features.on_call,
        pages = features.pages_7d,
        active = features.active_items,
        similar = features
            .similar_incident_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "N/A".to_string()),
    )
}

pub fn evidence_prompt(
    work_item: &WorkItemSummary,
    primary: &CandidateFeatures,
    backups: &[CandidateFeatures],
    constraints: &[ConstraintCheck],
) -> String {
    let mut prompt = format!(
        "Generate evidence bullets for a work item assignment decision.\n\n\
         Work Item:\n\
         - Service: {}\n\
         - Severity: {}\n\
         - Type: {}\n\
         - Description: {}\n\n{}",
        work_item.service,
        work_item.severity,
        work_item.kind,
        work_item.description,
        format_features("Primary Candidate", primary),
    );

    for (i, backup) in backups.iter().take(3).enumerate() {
        prompt.push('\n');
        prompt.push_str(&format_features(&format!("Backup Candidate {}", i + 1), backup));
    }

    prompt.push_str("\nConstraints Checked:\n");
    for constraint in constraints {
        let status = if constraint.passed { "PASSED" } else { "FAILED" };
        match &constraint.reason {
            Some(reason) => {
                prompt.push_str(&format!("- {}: {} ({})\n", constraint.name, status, reason))
            }
            None => prompt.push_str(&format!("- {}: {}\n", constraint.name, status)),
        }
    }

    prompt.push_str(
        "\nProduce 3-7 evidence bullets explaining why the primary candidate was \
         selected, and one why_not_next_best sentence comparing the primary to the \
         best backup using fit_score, resolves_count, and transfers_count.\n\
         Rules:\n\
         - Every claim must come from the features above; no outside knowledge.\n\
         - Every bullet is time-bounded (e.g. \"last 7 days\", \"last 90 days\").\n\
         - Every bullet names its source (e.g. \"Learner stats\", \"Vector similarity\", \
           \"On-call status\", \"Load tracking\").\n\
         - bullet type is one of: recent_resolution, on_call, low_load, \
           similar_incident, fit_score, general.\n\
         - No global claims, only comparisons grounded in the numbers provided.\n",
    );
    prompt
}

#[derive(Debug, Deserialize)]
struct RawBullet {
    #[serde(rename = "type")]
    kind: String,
    text: String,
    time_window: String,
    source: String,
}

#[derive(Debug, Deserialize)]
struct RawExplainPayload {
    evidence: Vec<RawBullet>,
    why_not_next_best: String,
}

fn parse_kind(raw: &str) -> EvidenceKind {
    match raw {
        "recent_resolution" => EvidenceKind::RecentResolution,
        "on_call" => EvidenceKind::OnCall,
        "low_load" => EvidenceKind::LowLoad,
        "similar_incident" => EvidenceKind::SimilarIncident,
        "fit_score" => EvidenceKind::FitScore,
        _ => EvidenceKind::General,
    }
}

/// Validate the model output: parseable, non-empty evidence array, all four
/// fields non-empty on every bullet.
pub fn parse_response(content: &str) -> Result<(Vec<Evidence>, String)> {
    let payload: RawExplainPayload = serde_json::from_str(content)
        .map_err(|e| AppError::DependencyUnavailable(format!("invalid model JSON: {}", e)))?;

    if payload.evidence.is_empty() {
        return Err(AppError::DependencyUnavailable(
            "model returned an empty evidence array".to_string(),
        ));
    }
    if payload.why_not_next_best.trim().is_empty() {
        return Err(AppError::DependencyUnavailable(
            "model returned an empty why_not_next_best".to_string(),
        ));
    }

    let mut evidence = Vec::with_capacity(payload.evidence.len());
    for (i, bullet) in payload.evidence.into_iter().enumerate() {
        if bullet.text.trim().is_empty()
            || bullet.time_window.trim().is_empty()
            || bullet.source.trim().is_empty()
        {
            return Err(AppError::DependencyUnavailable(format!(
                "evidence bullet {} is missing required fields",
                i
            )));
        }
        evidence.push(Evidence {
            kind: parse_kind(&bullet.kind),
            text: bullet.text,
            time_window: bullet.time_window,
            source: bullet.source,
        });
    }

    Ok((evidence, payload.why_not_next_best))
}

/// Deterministic template evidence from the primary's features. One bullet
/// per matched predicate, in a fixed order.
pub fn fallback_evidence(
    primary: &CandidateFeatures,
    backups: &[CandidateFeatures],
) -> (Vec<Evidence>, String) {
    let mut evidence = Vec::new();

    if primary.resolves_count > 0 {
        evidence.push(Evidence::new(
            EvidenceKind::RecentResolution,
            format!(
                "Resolved {} incidents in this service in the last 90 days",
                primary.resolves_count
            ),
            "last 90 days",
            "Learner stats",
        ));
    }
    if let Some(last) = primary.last_resolved_at {
        evidence.push(Evidence::new(
            EvidenceKind::RecentResolution,
            format!("Last resolved a similar incident on {}", last.format("%Y-%m-%d")),
            "recent",
            "Learner stats",
        ));
    }
    if primary.on_call {
        evidence.push(Evidence::new(
            EvidenceKind::OnCall,
            "Currently on call and available",
            "current",
            "On-call status",
        ));
    }
    if primary.pages_7d == 0 {
        evidence.push(Evidence::new(
            EvidenceKind::LowLoad,
            "No pages in the last 7 days, indicating low current load",
            "last 7 days",
            "Load tracking",
        ));
    }
    if let Some(score) = primary.similar_incident_score {
        evidence.push(Evidence::new(
            EvidenceKind::SimilarIncident,
            format!("Similarity score {:.2} against past incidents they resolved", score),
            "current",
            "Vector similarity",
        ));
    }

    let why_not_next_best = match backups.first() {
        Some(next) if primary.fit_score > next.fit_score => format!(
            "Primary candidate has a higher fit_score ({:.2} vs {:.2}) and resolved more \
             incidents ({} vs {}) in the last 90 days.",
            primary.fit_score, next.fit_score, primary.resolves_count, next.resolves_count
        ),
        Some(next) => format!(
            "Primary candidate was ranked above {} on the combined score; fit_score {:.2} vs \
             {:.2}, transfers {} vs {}.",
            next.display_name,
            primary.fit_score,
            next.fit_score,
            primary.transfers_count,
            next.transfers_count
        ),
        None => "Primary candidate selected based on fit score and availability.".to_string(),
    };

    (evidence, why_not_next_best)
}

/// The response always carries at least one bullet.
pub fn ensure_nonempty(mut evidence: Vec<Evidence>, primary: &CandidateFeatures) -> Vec<Evidence> {
    if evidence.is_empty() {
        evidence.push(Evidence::new(
            EvidenceKind::General,
            format!("Selected based on fit_score of {:.2}", primary.fit_score),
            "current",
            "Decision engine",
        ));
    }
    evidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn features(fit: f64, resolves: i32) -> CandidateFeatures {
        CandidateFeatures {
            human_id: "h1".to_string(),
            display_name: "Casey".to_string(),
            fit_score: fit,
            resolves_count: resolves,
            transfers_count: 1,
            last_resolved_at: None,
            on_call: false,
            pages_7d: 3,
            active_items: 2,
            similar_incident_score: None,
        }
    }

    #[test]
    fn parse_accepts_a_well_formed_payload() {
        let content = serde_json::json!({
            "evidence": [
                {"type": "fit_score", "text": "Fit 0.85", "time_window": "current", "source": "Learner stats"}
            ],
            "why_not_next_best": "Higher fit."
        })
        .to_string();
        let (evidence, why_not) = parse_response(&content).unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].kind, EvidenceKind::FitScore);
        assert_eq!(why_not, "Higher fit.");
    }

    #[test]
    fn parse_rejects_empty_evidence() {
        let content = r#"{"evidence": [], "why_not_next_best": "x"}"#;
        assert!(parse_response(content).is_err());
    }

    #[test]
    fn parse_rejects_missing_fields() {
        let content = serde_json::json!({
            "evidence": [{"type": "general", "text": "", "time_window": "now", "source": "s"}],
            "why_not_next_best": "x"
        })
        .to_string();
        assert!(parse_response(&content).is_err());
        assert!(parse_response("not json").is_err());
    }

    #[test]
    fn unknown_bullet_types_degrade_to_general() {
        let content = serde_json::json!({
            "evidence": [{"type": "psychic_intuition", "text": "t", "time_window": "now", "source": "s"}],
            "why_not_next_best": "x"
        })
        .to_string();
        let (evidence, _) = parse_response(&content).unwrap();
        assert_eq!(evidence[0].kind, EvidenceKind::General);
    }

    #[test]
    fn fallback_emits_one_bullet_per_matched_predicate() {
        let mut primary = features(0.85, 12);
        primary.last_resolved_at = Some(Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap());
        primary.on_call = true;
        primary.pages_7d = 0;
        primary.similar_incident_score = Some(0.72);

        let (evidence, _) = fallback_evidence(&primary, &[]);
        assert_eq!(evidence.len(), 5);
        assert!(evidence.iter().any(|e| e.kind == EvidenceKind::OnCall));
        assert!(evidence.iter().any(|e| e.kind == EvidenceKind::LowLoad));
    }

    #[test]
    fn fallback_compares_against_the_top_backup() {
        let primary = features(0.85, 12);
        let backup = features(0.75, 8);
        let (_, why_not) = fallback_evidence(&primary, &[backup]);
        assert!(why_not.contains("0.85"));
        assert!(why_not.contains("0.75"));
        assert!(why_not.contains("12"));
        assert!(why_not.contains("8"));
    }

    #[test]
    fn fallback_is_deterministic() {
        let primary = features(0.6, 3);
        let a = fallback_evidence(&primary, &[]);
        let b = fallback_evidence(&primary, &[]);
        assert_eq!(a.1, b.1);
        assert_eq!(a.0.len(), b.0.len());
    }

    #[test]
    fn ensure_nonempty_adds_a_general_bullet() {
        let primary = features(0.42, 0);
        let evidence = ensure_nonempty(Vec::new(), &primary);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].kind, EvidenceKind::General);
        assert!(evidence[0].text.contains("0.42"));
    }

    #[test]
    fn prompt_lists_features_verbatim() {
        let work_item = WorkItemSummary {
            id: "wi-1".to_string(),
            service: "api".to_string(),
            severity: "sev2".to_string(),
            description: "500 on /v1/users".to_string(),
            kind: "incident".to_string(),
        };
        let primary = features(0.85, 12);
        let prompt = evidence_prompt(&work_item, &primary, &[], &[]);
        assert!(prompt.contains("Fit Score: 0.85"));
        assert!(prompt.contains("500 on /v1/users"));
        assert!(prompt.contains("no outside knowledge"));
    }
}
