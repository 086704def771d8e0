//! Optional `ollama serve` child-process lifecycle.
//!
//! If an Ollama server is already answering on the configured base URL
//! we use it and own nothing; otherwise we spawn one and stop it again
//! on shutdown.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tokio::process::{Child, Command};

const POLL_INTERVAL: Duration = Duration::from_millis(300);

pub struct OllamaHandle {
    child: Option<Child>,
}

impl OllamaHandle {
    pub fn owned(&self) -> bool {
        self.child.is_some()
    }
}

async fn tags_ok(client: &reqwest::Client, base_url: &str) -> bool {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    match client
        .get(&url)
        .timeout(Duration::from_secs(1))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Ensure an Ollama server is reachable, spawning one if needed.
pub async fn start(base_url: &str, startup_timeout_sec: u64) -> Result<OllamaHandle> {
    let client = reqwest::Client::new();

    if tags_ok(&client, base_url).await {
        tracing::info!("Ollama already running at {}", base_url);
        return Ok(OllamaHandle { child: None });
    }

    tracing::info!("Starting ollama serve");
    let mut child = Command::new("ollama")
        .arg("serve")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn `ollama serve`")?;

    let deadline = Instant::now() + Duration::from_secs(startup_timeout_sec);
    while Instant::now() < deadline {
        if tags_ok(&client, base_url).await {
            return Ok(OllamaHandle { child: Some(child) });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let _ = child.kill().await;
    bail!("Ollama did not start within {}s", startup_timeout_sec);
}

/// Stop the server if and only if we started it.
pub async fn stop(handle: &mut OllamaHandle) {
    if let Some(mut child) = handle.child.take() {
        if let Err(err) = child.kill().await {
            tracing::warn!("Failed to stop ollama serve: {}", err);
        }
    }
}
