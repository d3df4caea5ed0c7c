use std::sync::Arc;

use diagen_api::{app::build_router, config::Config, logging::init_logging, state::AppState};
use diagen_context::SessionRegistry;
use diagen_llm::{ClientFactory, OpenAIConfig};
use diagen_persist::{AutosaveCoordinator, StoreBuilder};
use diagen_relay::Relay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    tracing::info!("Starting Diagen API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Storage
    let mut stores = StoreBuilder::new()
        .backend(config.storage.backend)
        .database(&config.storage.database);
    if let Some(uri) = &config.mongodb_uri {
        stores = stores.mongodb_uri(uri);
    }
    let stores = stores.build().await?;
    tracing::info!(backend = ?config.storage.backend, "Storage ready");

    // LLM client
    let mut llm_config = OpenAIConfig::new(config.openai_api_key.clone());
    if let Some(base_url) = &config.llm.base_url {
        llm_config = llm_config.with_base_url(base_url);
    }
    let client = ClientFactory::create_client(&llm_config)?;

    let sessions = Arc::new(SessionRegistry::new((&config.sessions).into()));
    let autosave = AutosaveCoordinator::new(stores.versions.clone(), (&config.autosave).into());

    let relay = Relay::builder()
        .client(client)
        .sessions(sessions)
        .autosave(autosave.clone())
        .config(config.llm.relay_config())
        .build()?;

    let state = Arc::new(AppState::new(config.clone(), stores, autosave.clone(), relay));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Pending edits must not be lost on shutdown
    for (document_id, e) in autosave.flush_all().await {
        tracing::error!(document_id = %document_id, error = %e, "Final autosave failed");
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
