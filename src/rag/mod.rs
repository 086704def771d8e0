//! Retrieval subsystem: chunking, cosine top-k ranking, context
//! assembly, and the fallback answer extractor.

pub mod answer;
pub mod chunker;
pub mod context_builder;
pub mod embedder;
pub mod ranker;
pub mod store;

pub use answer::{looks_readable, pick_answer};
pub use chunker::chunk_text;
pub use context_builder::format_context;
pub use embedder::{Embedder, OllamaEmbedder};
pub use ranker::{cosine_top_k, RankError};
pub use store::{ChunkStore, RankedHit, SqliteStore};
