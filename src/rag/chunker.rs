//! Character-window text chunking for retrieval ingestion.
//!
//! Splits normalized text into overlapping fixed-size windows. Windows
//! are measured in characters, not bytes, so multi-byte text never gets
//! cut mid-codepoint.

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Normalization first: line endings unified, every line trimmed, empty
/// lines dropped. Whitespace-only input yields no chunks. Consecutive
/// windows overlap by `overlap` characters; the scan always advances at
/// least one character per iteration, so `overlap >= chunk_size` still
/// terminates.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = normalized.chars().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let end = (start + chunk_size).min(total);
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end == total {
            break;
        }

        // Guaranteed forward progress even when the overlap would
        // otherwise stall the scan.
        let next = end.saturating_sub(overlap);
        start = next.max(start + 1);
    }

    chunks
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
