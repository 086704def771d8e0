//! Optional generative answer path via a local Ollama server.

pub mod client;
pub mod process;
pub mod prompt;

pub use client::{generate, OllamaError};
pub use process::{start, stop, OllamaHandle};
pub use prompt::build_prompt;
