//! Prompt assembly for the generative answer path.

pub const SYSTEM_PROMPT: &str = "\
You are a workshop assistant for a single project car. Answer the \
question using only the provided context (service manual excerpts, \
owner notes, and the parts history). If the context does not contain \
the answer, say so plainly instead of guessing. Answer in the language \
the question was asked in. Keep answers short and practical.";

/// Build the full prompt: system instructions, then the question,
/// with the retrieved context always at the end.
pub fn build_prompt(question: &str, context: &str) -> String {
    let question = question.trim();
    let context = context.trim();

    format!("{SYSTEM_PROMPT}\n\nQUESTION:\n{question}\n\nCONTEXT:\n{context}\n\nANSWER:\n")
}
