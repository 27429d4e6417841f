mod annotate;
mod auth;
mod config;
mod db;
mod errors;
mod ingest;
mod library;
mod models;
mod review;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::annotate::InferenceClient;
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::ingest::extract::ArticleExtractor;
use crate::ingest::search::NewsSearchClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Newsfolio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and create the schema
    let db = create_pool(&config.database_url).await?;
    init_schema(&db).await?;

    // Annotation model client (summarizer, sentiment, keywords)
    let annotator = Arc::new(InferenceClient::new(
        config.inference_api_url.clone(),
        config.inference_api_key.clone(),
    ));
    info!("Annotation client initialized ({})", config.inference_api_url);

    // Article-extraction and news-search clients
    let extractor = Arc::new(ArticleExtractor::new(config.extractor_url.clone()));
    let news = Arc::new(NewsSearchClient::new(
        config.news_api_url.clone(),
        config.news_api_key.clone(),
    ));
    info!("External service clients initialized");

    // Session store, keyed by signed cookie
    let sessions = SessionStore::new(config.secret_key.clone());

    // Build app state
    let state = AppState {
        db,
        annotator,
        extractor,
        news,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
