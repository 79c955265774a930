use std::sync::Arc;

use crate::core::history::HistoryStore;
use crate::core::rate::RateProvider;

/// Shared application state available to all route handlers via axum's
/// `State` extractor. Both collaborators are capabilities behind traits, so
/// handlers stay independent of the concrete quote source and store backend.
pub struct AppState {
    pub provider: Arc<dyn RateProvider>,
    pub store: Arc<dyn HistoryStore>,
}
