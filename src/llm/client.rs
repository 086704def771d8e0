//! Non-streaming Ollama generate client.

use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Ollama request timed out")]
    Timeout,
    #[error("Ollama connection failed")]
    Connection,
    #[error("Ollama returned bad response: {message}")]
    BadResponse {
        message: String,
        status: Option<u16>,
    },
    #[error("Ollama request failed: {0}")]
    Other(String),
}

impl OllamaError {
    /// Stable machine-readable tag carried in error responses.
    pub fn tag(&self) -> &'static str {
        match self {
            OllamaError::Timeout => "timeout",
            OllamaError::Connection => "connection",
            OllamaError::BadResponse { .. } => "bad_response",
            OllamaError::Other(_) => "unknown",
        }
    }
}

/// Call `POST /api/generate` (non-stream) and return the response text.
pub async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    model: &str,
    prompt: &str,
) -> Result<String, OllamaError> {
    let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
    let payload = json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
    });

    let response = client
        .post(&url)
        .json(&payload)
        .send()
        .await
        .map_err(|err| {
            if err.is_timeout() {
                OllamaError::Timeout
            } else if err.is_connect() {
                OllamaError::Connection
            } else {
                OllamaError::Other(err.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body = body.trim();
        let message = if body.is_empty() {
            format!("non-200 status {}", status.as_u16())
        } else {
            let head: String = body.chars().take(500).collect();
            format!("non-200 status {}: {}", status.as_u16(), head)
        };
        return Err(OllamaError::BadResponse {
            message,
            status: Some(status.as_u16()),
        });
    }

    let data: Value = response.json().await.map_err(|_| OllamaError::BadResponse {
        message: "response was not valid JSON".to_string(),
        status: None,
    })?;

    match data.get("response").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(OllamaError::BadResponse {
            message: "response field was empty".to_string(),
            status: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tags_are_stable() {
        assert_eq!(OllamaError::Timeout.tag(), "timeout");
        assert_eq!(OllamaError::Connection.tag(), "connection");
        assert_eq!(
            OllamaError::BadResponse {
                message: "x".to_string(),
                status: Some(500)
            }
            .tag(),
            "bad_response"
        );
        assert_eq!(OllamaError::Other("x".to_string()).tag(), "unknown");
    }
}
