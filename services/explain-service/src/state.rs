use crate::config::Config;
use routing_common::adapters::language_model::LanguageModel;
use std::sync::Arc;

/// Explanation is stateless: configuration plus the language-model adapter.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub language_model: Arc<dyn LanguageModel>,
}
