use std::env;

use anyhow::Context;
use tokio::net::TcpListener;

use carhelper_backend::core::config::{AppPaths, Settings};
use carhelper_backend::core::logging;
use carhelper_backend::llm;
use carhelper_backend::server::router::router;
use carhelper_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env();
    tracing::info!(
        "USE_OLLAMA={} OLLAMA_BASE_URL={} OLLAMA_MODEL={} OLLAMA_TIMEOUT_SEC={}",
        settings.use_ollama,
        settings.ollama_base_url,
        settings.ollama_model,
        settings.ollama_timeout_sec
    );

    let mut ollama_handle = None;
    if settings.use_ollama {
        match llm::process::start(&settings.ollama_base_url, settings.ollama_timeout_sec).await {
            Ok(handle) => ollama_handle = Some(handle),
            Err(err) => tracing::warn!("Failed to start Ollama: {}", err),
        }
    }

    let state = AppState::initialize(paths, settings).await?;

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8000);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = ollama_handle.as_mut() {
        llm::process::stop(handle).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
