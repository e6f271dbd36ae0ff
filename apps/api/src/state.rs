use std::sync::Arc;

use crate::config::Config;
use crate::suggestion::dispatcher::SuggestionDispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Provider-first when configured, heuristic otherwise. Never fails.
    pub dispatcher: Arc<SuggestionDispatcher>,
}
