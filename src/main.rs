use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

mod chat;
mod config;
mod format;
mod intent;
mod llm;
mod router;
mod schema;
mod session;
mod store;
mod util;
mod web;

use crate::config::{AppConfig, CliArgs, LoggingConfig};
use crate::llm::LlmManager;
use crate::store::postgrest::PostgrestStore;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Initialize logging
    init_tracing(&config.logging);

    info!(
        "Using employee schema {} (table {}, {} columns)",
        config.schema.version,
        config.schema.table,
        config.schema.columns.len()
    );

    // Initialize LLM manager
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = LlmManager::new(&config.llm, &config.schema)?;

    info!("Connecting to employee store at {}", config.store.url);
    let store = PostgrestStore::new(&config.store, &config.schema.table)?;

    let app_state = Arc::new(AppState::new(config.clone(), llm_manager, Arc::new(store)));

    // Expired conversations are swept in the background
    let sweeper_state = Arc::clone(&app_state);
    let sweep_every = Duration::from_secs(config.session.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let removed = sweeper_state.sessions.evict_expired().await;
            if removed > 0 {
                debug!("Swept {} expired sessions", removed);
            }
        }
    });

    // Start the web server
    info!("Starting Staff Query server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
