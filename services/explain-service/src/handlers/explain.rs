use crate::evidence;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse, Responder};
use routing_common::adapters::language_model::CompletionRequest;
use routing_common::Result;
use routing_models::{Evidence, ExplainDecisionRequest, ExplainDecisionResponse};
use tracing::{info, warn};

/// Grounded evidence for a decision: model-generated when the adapter
/// cooperates, template-generated otherwise, never empty either way.
#[post("/explain")]
pub async fn explain_decision(
    state: web::Data<AppState>,
    request: web::Json<ExplainDecisionRequest>,
) -> Result<impl Responder> {
    let request = request.into_inner();

    let (evidence, why_not_next_best) = match generate_with_model(&state, &request).await {
        Ok(result) => result,
        Err(err) => {
            warn!(
                decision_id = %request.decision_id,
                "model evidence generation failed ({}), using fallback templates",
                err
            );
            evidence::fallback_evidence(&request.primary_features, &request.backup_features)
        }
    };

    let evidence = evidence::ensure_nonempty(evidence, &request.primary_features);

    info!(
        decision_id = %request.decision_id,
        bullets = evidence.len(),
        "explanation generated"
    );

    Ok(HttpResponse::Ok().json(ExplainDecisionResponse {
        decision_id: request.decision_id,
        evidence,
        constraints: request.constraints_checked,
        why_not_next_best,
    }))
}

async fn generate_with_model(
    state: &AppState,
    request: &ExplainDecisionRequest,
) -> Result<(Vec<Evidence>, String)> {
    let prompt = evidence::evidence_prompt(
        &request.work_item,
        &request.primary_features,
        &request.backup_features,
        &request.constraints_checked,
    );

    let completion = CompletionRequest::deterministic(evidence::SYSTEM_PROMPT, prompt)
        .with_json_schema(evidence::response_schema());

    let content = state.language_model.complete(completion).await?;
    evidence::parse_response(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::{test, App};
    use routing_common::adapters::language_model::MockLanguageModel;
    use routing_common::AppError;
    use routing_models::{CandidateFeatures, EvidenceKind, WorkItemSummary};
    use std::sync::Arc;

    fn features(id: &str, fit: f64, resolves: i32) -> CandidateFeatures {
        CandidateFeatures {
            human_id: id.to_string(),
            display_name: id.to_uppercase(),
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

    fn explain_request() -> ExplainDecisionRequest {
        ExplainDecisionRequest {
            decision_id: "dec-1".to_string(),
            work_item: WorkItemSummary {
                id: "wi-1".to_string(),
                service: "api".to_string(),
                severity: "sev2".to_string(),
                description: "500 on /v1/users".to_string(),
                kind: "incident".to_string(),
            },
            primary_human_id: "h1".to_string(),
            primary_features: features("h1", 0.85, 12),
            backup_human_ids: vec!["h2".to_string()],
            backup_features: vec![features("h2", 0.75, 8)],
            constraints_checked: vec![],
        }
    }

    async fn call(model: MockLanguageModel) -> ExplainDecisionResponse {
        let state = AppState {
            config: Config::default(),
            language_model: Arc::new(model),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(explain_decision),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/explain")
            .set_json(explain_request())
            .to_request();
        test::call_and_read_body_json(&app, request).await
    }

    #[actix_web::test]
    async fn uses_model_evidence_when_the_response_validates() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().returning(|_| {
            Ok(serde_json::json!({
                "evidence": [{
                    "type": "fit_score",
                    "text": "Fit score 0.85 in the api service",
                    "time_window": "current",
                    "source": "Learner stats"
                }],
                "why_not_next_best": "Higher fit (0.85 vs 0.75)."
            })
            .to_string())
        });

        let response = call(model).await;
        assert_eq!(response.evidence.len(), 1);
        assert_eq!(response.evidence[0].kind, EvidenceKind::FitScore);
        assert_eq!(response.why_not_next_best, "Higher fit (0.85 vs 0.75).");
    }

    #[actix_web::test]
    async fn falls_back_to_templates_on_invalid_model_json() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok("not valid json at all".to_string()));

        let response = call(model).await;
        assert!(!response.evidence.is_empty());
        // Template comparison grounded in the provided numbers.
        assert!(response.why_not_next_best.contains("0.85"));
        assert!(response.why_not_next_best.contains("0.75"));
    }

    #[actix_web::test]
    async fn falls_back_when_the_adapter_is_unreachable() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().returning(|_| {
            Err(AppError::DependencyUnavailable("connection refused".to_string()))
        });

        let response = call(model).await;
        assert!(!response.evidence.is_empty());
        assert!(response
            .evidence
            .iter()
            .any(|e| e.kind == EvidenceKind::RecentResolution));
    }
}
