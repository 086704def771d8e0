//! Fallback answer extraction when no generative model is configured.
//!
//! OCR output quality varies a lot between manual pages, so the
//! extractor prefers the first ranked chunk that actually reads like
//! prose instead of blindly returning the top hit.

use super::context_builder::clean_text;

const ANSWER_CHAR_LIMIT: usize = 600;
const MIN_READABLE_CHARS: usize = 120;
const MIN_LETTER_RATIO: f64 = 0.55;
const MAX_WEIRD_RATIO: f64 = 0.08;
const ALLOWED_PUNCTUATION: &[char] = &[' ', '.', ',', ':', ';', '(', ')', '/', '-', '\''];

/// Heuristic for "this chunk is readable prose, not OCR noise".
pub fn looks_readable(text: &str) -> bool {
    let total = text.chars().count();
    if total < MIN_READABLE_CHARS {
        return false;
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if (letters as f64) / (total as f64) < MIN_LETTER_RATIO {
        return false;
    }

    let weird = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !ALLOWED_PUNCTUATION.contains(c))
        .count();
    if (weird as f64) / (total as f64) > MAX_WEIRD_RATIO {
        return false;
    }

    text.contains(' ')
}

/// Pick a human-readable answer from ranked chunk texts.
///
/// Scans the ranked order and returns the first 600 characters of the
/// first readable candidate; if none qualifies, falls back to the top
/// hit regardless of readability. No ranked indices yields an empty
/// string.
pub fn pick_answer(ranked: &[usize], texts: &[String]) -> String {
    for &idx in ranked {
        let candidate = clean_text(texts.get(idx).map(String::as_str).unwrap_or(""));
        if looks_readable(&candidate) {
            return head_chars(&candidate, ANSWER_CHAR_LIMIT);
        }
    }

    if let Some(&top) = ranked.first() {
        let cleaned = clean_text(texts.get(top).map(String::as_str).unwrap_or(""));
        return head_chars(&cleaned, ANSWER_CHAR_LIMIT);
    }

    String::new()
}

fn head_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}
