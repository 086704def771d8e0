//! Global application state shared across all routes.
//!
//! Built once at startup and handed to handlers behind an `Arc`; the
//! retrieval snapshot and parts ledger inside it are immutable, so
//! request handling needs no locks.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::rag::{ChunkStore, Embedder, OllamaEmbedder, SqliteStore};
use crate::rules::parts::PartsLedger;
use crate::rules::RuleEngine;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("store initialization failed: {0}")]
    Store(ApiError),
    #[error("embedder initialization failed: {0}")]
    Embedder(ApiError),
    #[error("http client initialization failed: {0}")]
    Http(reqwest::Error),
}

pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub store: SqliteStore,
    pub chunks: Arc<ChunkStore>,
    pub ledger: Arc<PartsLedger>,
    pub rules: RuleEngine,
    pub embedder: Arc<dyn Embedder>,
    pub generate_client: reqwest::Client,
}

impl AppState {
    /// Load settings, open the database, and build the immutable
    /// retrieval snapshot and parts ledger.
    pub async fn initialize(
        paths: AppPaths,
        settings: Settings,
    ) -> Result<Arc<Self>, InitializationError> {
        let store = SqliteStore::new(paths.db_path.clone())
            .await
            .map_err(InitializationError::Store)?;

        let chunks = store
            .load_chunks(settings.embed_dim)
            .await
            .map_err(InitializationError::Store)?;

        let parts = store
            .load_parts()
            .await
            .map_err(InitializationError::Store)?;
        let ledger = PartsLedger::new(parts);

        let embedder = OllamaEmbedder::new(&settings).map_err(InitializationError::Embedder)?;

        let generate_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.ollama_timeout_sec))
            .build()
            .map_err(InitializationError::Http)?;

        tracing::info!("Chunks loaded: {}", chunks.len());
        tracing::info!("Parts rows loaded: {}", ledger.len());

        Ok(Arc::new(AppState {
            paths: Arc::new(paths),
            settings,
            store,
            chunks: Arc::new(chunks),
            ledger: Arc::new(ledger),
            rules: RuleEngine::with_default_rules(),
            embedder: Arc::new(embedder),
            generate_client,
        }))
    }
}
