//! The question-answering endpoint.
//!
//! Dispatch order: structured parts-ledger rules first, then semantic
//! retrieval over the chunk snapshot, then either a generative answer
//! via Ollama or the readability-based fallback extractor.

use std::sync::{Arc, OnceLock};

use axum::extract::State;
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::llm;
use crate::llm::OllamaError;
use crate::rag::store::RankedHit;
use crate::rag::{format_context, pick_answer, ChunkStore};
use crate::state::AppState;

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 20;
const SNIPPET_CHAR_LIMIT: usize = 300;

#[derive(Debug, Deserialize)]
pub struct AskIn {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Serialize)]
pub struct SourceOut {
    pub source: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub page: Option<u32>,
    pub score: f32,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    Off,
    Rules,
    Ollama,
    OllamaError,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceOut>,
    pub llm_mode: LlmMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl AskResponse {
    fn empty(mode: LlmMode) -> Self {
        AskResponse {
            answer: String::new(),
            sources: Vec::new(),
            llm_mode: mode,
            error: None,
        }
    }
}

fn page_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#page=(\d+)").expect("page pattern is valid"))
}

/// Extract the page number from a `<document>#page=<n>` locator.
fn page_from_ref(reference: &str) -> Option<u32> {
    page_pattern()
        .captures(reference)
        .and_then(|captures| captures[1].parse().ok())
}

fn build_sources(hits: &[RankedHit], chunks: &ChunkStore) -> Vec<SourceOut> {
    hits.iter()
        .map(|hit| {
            let lookup = |arr: &[String]| arr.get(hit.index).cloned().unwrap_or_default();
            let reference = lookup(chunks.refs());
            let snippet: String = lookup(chunks.texts())
                .chars()
                .take(SNIPPET_CHAR_LIMIT)
                .collect();

            SourceOut {
                source: lookup(chunks.sources()),
                page: page_from_ref(&reference),
                reference,
                score: hit.score,
                snippet: snippet.trim().to_string(),
            }
        })
        .collect()
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskIn>,
) -> Result<Json<AskResponse>, ApiError> {
    if !(1..=MAX_TOP_K).contains(&payload.top_k) {
        return Err(ApiError::BadRequest(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let question = payload.question.trim();
    if question.is_empty() {
        return Ok(Json(AskResponse::empty(LlmMode::Off)));
    }

    if let Some(rule_answer) = state.rules.try_match(question, &state.ledger) {
        tracing::debug!("Rule intent '{}' matched", rule_answer.kind);
        return Ok(Json(AskResponse {
            answer: rule_answer.answer,
            sources: Vec::new(),
            llm_mode: LlmMode::Rules,
            error: None,
        }));
    }

    // Snapshot reference for the rest of the request; a concurrent
    // re-ingestion swap cannot change what this request sees.
    let chunks = Arc::clone(&state.chunks);
    if chunks.is_empty() {
        return Ok(Json(AskResponse::empty(LlmMode::Off)));
    }

    let query = state.embedder.embed(question).await?;
    let hits = chunks.search(&query, payload.top_k)?;

    let sources = build_sources(&hits, &chunks);
    let ranked: Vec<usize> = hits.iter().map(|hit| hit.index).collect();

    if state.settings.use_ollama {
        let context = format_context(
            &ranked,
            chunks.sources(),
            chunks.refs(),
            chunks.texts(),
            state.settings.per_chunk_char_limit,
            state.settings.max_context_chars,
        );
        let prompt = llm::build_prompt(question, &context);

        match llm::generate(
            &state.generate_client,
            &state.settings.ollama_base_url,
            &state.settings.ollama_model,
            &prompt,
        )
        .await
        {
            Ok(text) => Ok(Json(AskResponse {
                answer: text,
                sources,
                llm_mode: LlmMode::Ollama,
                error: None,
            })),
            Err(err) => {
                tracing::warn!("Ollama generate failed: {}", err);
                let answer = match &err {
                    OllamaError::Timeout => "LLM timeout",
                    OllamaError::Connection => "LLM not available",
                    OllamaError::BadResponse { .. } => "LLM bad response",
                    OllamaError::Other(_) => "LLM error",
                };
                Ok(Json(AskResponse {
                    answer: answer.to_string(),
                    sources,
                    llm_mode: LlmMode::OllamaError,
                    error: Some(err.tag()),
                }))
            }
        }
    } else {
        let answer = pick_answer(&ranked, chunks.texts());
        Ok(Json(AskResponse {
            answer,
            sources,
            llm_mode: LlmMode::Off,
            error: None,
        }))
    }
}
