use crate::clients::{ExecuteClient, ExplainClient, LearnerClient};
use crate::config::Config;
use routing_common::adapters::language_model::LanguageModel;
use routing_common::adapters::vector_index::VectorIndex;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything a handler needs, wired once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub language_model: Arc<dyn LanguageModel>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub learner: Arc<LearnerClient>,
    pub explain: Arc<ExplainClient>,
    pub execute: Arc<ExecuteClient>,
}
