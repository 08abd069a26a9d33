use crate::clients::{DecisionTrigger, LearnerForwarder};
use crate::config::Config;
use routing_common::adapters::language_model::LanguageModel;
use routing_common::adapters::vector_index::VectorIndex;
use routing_common::projection::PcaProjector;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything a handler needs, wired once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub language_model: Arc<dyn LanguageModel>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub projector: Arc<PcaProjector>,
    pub decision: Arc<DecisionTrigger>,
    pub learner: Arc<LearnerForwarder>,
}
