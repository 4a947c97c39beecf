mod config;
mod db;
mod errors;
mod extractor;
mod llm_client;
mod retry;
mod routes;
mod screening;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmBackend, LlmClient};
use crate::retry::RetryPolicy;
use crate::routes::build_router;
use crate::screening::batch::BatchScreener;
use crate::screening::scorer::CvScorer;
use crate::state::AppState;
use crate::store::{AnalysisStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing env vars or a bad weight table)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and the injected store handle
    let pool = create_pool(&config.database_url).await?;
    let store: Arc<dyn AnalysisStore> = Arc::new(PgStore::new(pool));

    // Initialize LLM client
    let llm: Arc<dyn LlmBackend> = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build the scoring pipeline around the shared LLM handle
    let scorer = Arc::new(CvScorer::new(
        llm.clone(),
        config.weights,
        RetryPolicy::default(),
    ));
    let screener = Arc::new(BatchScreener::new(scorer));

    let state = AppState { store, llm, screener };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
