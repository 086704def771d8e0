//! Assembles ranked chunks into a size-bounded context block.
//!
//! The output format is a stable contract consumed by the prompt
//! builder: per hit a header line `[<rank>] source=<source> ref=<ref>`,
//! the chunk text, and a blank separator line.

/// Collapse every whitespace run (including newlines) to a single space
/// and trim the ends.
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// Format ranked chunks into a bounded context string.
///
/// Ranks are 1-based over the original `ranked` order and are not
/// renumbered when an entry is skipped. Indices past the end of the
/// metadata arrays degrade to empty strings. Each appended line costs
/// its length plus one separator character against `max_context_chars`;
/// the first line that would exceed the budget stops assembly entirely.
pub fn format_context(
    ranked: &[usize],
    sources: &[String],
    refs: &[String],
    texts: &[String],
    per_chunk_char_limit: usize,
    max_context_chars: usize,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut total = 0usize;

    fn push_line(
        lines: &mut Vec<String>,
        total: &mut usize,
        max: usize,
        line: String,
    ) -> bool {
        let cost = line.chars().count() + 1;
        if *total + cost > max {
            return false;
        }
        *total += cost;
        lines.push(line);
        true
    }

    'hits: for (rank0, &idx) in ranked.iter().enumerate() {
        let lookup = |arr: &[String]| arr.get(idx).map(|s| clean_text(s)).unwrap_or_default();

        let source = lookup(sources);
        let reference = lookup(refs);
        let mut text = lookup(texts);

        if text.is_empty() {
            continue;
        }

        if text.chars().count() > per_chunk_char_limit {
            text = truncate_chars(&text, per_chunk_char_limit);
        }

        let header = format!("[{}] source={} ref={}", rank0 + 1, source, reference);

        for line in [header, text, String::new()] {
            if !push_line(&mut lines, &mut total, max_context_chars, line) {
                break 'hits;
            }
        }
    }

    lines.join("\n").trim().to_string()
}
