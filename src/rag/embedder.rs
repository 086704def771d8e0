//! Query embedding collaborator.
//!
//! The retrieval core never talks to the network itself; it receives a
//! ready query vector. This module provides the production embedder
//! (Ollama's embeddings endpoint) behind a trait so tests can inject a
//! deterministic stand-in.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::Settings;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one query string into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(settings: &Settings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.ollama_timeout_sec))
            .build()
            .map_err(ApiError::internal)?;

        Ok(OllamaEmbedder {
            client,
            base_url: settings.ollama_base_url.trim_end_matches('/').to_string(),
            model: settings.embed_model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "prompt": text }))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() || err.is_connect() {
                    ApiError::ServiceUnavailable
                } else {
                    ApiError::internal(err)
                }
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "embedding request returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(ApiError::internal)?;
        if parsed.embedding.is_empty() {
            return Err(ApiError::Internal(
                "embedding response was empty".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }
}
