use std::sync::Arc;

use sqlx::SqlitePool;

use crate::annotate::Annotator;
use crate::config::Config;
use crate::ingest::extract::ArticleExtractor;
use crate::ingest::search::NewsSearchClient;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every service object is constructed once in `main`; there are no
/// process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Pluggable annotation backend. Default: the hosted inference client.
    pub annotator: Arc<dyn Annotator>,
    pub extractor: Arc<ArticleExtractor>,
    pub news: Arc<NewsSearchClient>,
    pub sessions: SessionStore,
    /// Kept whole for handlers that need deploy-time settings.
    #[allow(dead_code)]
    pub config: Config,
}
