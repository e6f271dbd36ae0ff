mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod suggestion;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::suggestion::dispatcher::SuggestionDispatcher;
use crate::suggestion::engine::{ProviderEngine, SuggestError};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Smart Todo API v{}", env!("CARGO_PKG_VERSION"));

    let tables = Arc::new(config.load_tables()?);
    if let Some(path) = &config.suggestion_tables_path {
        info!("Suggestion tables loaded from {}", path.display());
    }

    let dispatcher = build_dispatcher(&config, tables)?;

    let state = AppState {
        config: config.clone(),
        dispatcher: Arc::new(dispatcher),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Provider-backed when configured, heuristic-only otherwise.
fn build_dispatcher(
    config: &Config,
    tables: Arc<suggestion::tables::SuggestionTables>,
) -> Result<SuggestionDispatcher> {
    let settings = match config.provider_settings() {
        Ok(settings) => settings,
        Err(SuggestError::ConfigurationMissing(reason)) if config.ai_provider_enabled => {
            warn!("AI provider enabled but unusable ({reason}); running heuristic-only");
            return Ok(SuggestionDispatcher::heuristic_only(tables));
        }
        Err(_) => {
            info!("AI provider disabled; running heuristic-only");
            return Ok(SuggestionDispatcher::heuristic_only(tables));
        }
    };

    let llm = LlmClient::new(&settings)?;
    info!(
        "AI provider enabled (model: {}, timeout: {:.1}s, retries: {})",
        llm.model(),
        settings.timeout.as_secs_f64(),
        settings.effective_retries()
    );

    let provider = ProviderEngine::new(llm, tables.clone());
    Ok(SuggestionDispatcher::with_provider(
        tables,
        Arc::new(provider),
        settings.total_budget(),
    ))
}
